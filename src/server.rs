//! HTTP server for the vehicle search.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/search` | Form metadata, echoed params, carried-over `errors` |
//! | `GET`  | `/search/results` | Search from the query string |
//! | `POST` | `/search/results` | Search from a url-encoded form |
//! | `GET`  | `/search/suggestions?q=` | Autocomplete strings |
//! | `GET`  | `/search/history` | Recent searches, stats, popular queries |
//! | `POST` | `/search/history/clear` | Delete all history |
//! | `GET`  | `/classifications` | All classifications, by name |
//! | `GET`  | `/inventory` | Every vehicle, by make then model |
//! | `GET`  | `/inventory/classification/{id}` | Vehicles in one classification |
//! | `GET`  | `/inventory/detail/{id}` | One vehicle |
//!
//! A search whose parameters fail validation is answered with
//! `303 See Other` to `/search?error=<message>&error=<message>...` so the
//! form can show every problem at once. Other errors use the JSON schema in
//! [`crate::error`].
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Path, Query, RawQuery, State},
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use motorlot_core::history::Requester;
use motorlot_core::models::{Classification, VehicleListing};
use motorlot_core::ranges::FilterMetadata;
use motorlot_core::store::{HistoryStore, InventoryStore};
use motorlot_core::RawSearchParams;

use crate::config::Config;
use crate::error::AppError;
use crate::history::{history_page, record_detached, HistoryPage};
use crate::search::{bounded, form_metadata, search_page};
use crate::sqlite_store::SqliteStore;

/// Everything the server needs from a store.
pub trait Backend: InventoryStore + HistoryStore {}

impl<T: InventoryStore + HistoryStore> Backend for T {}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn Backend>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Backend>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

/// Build the router with all routes and layers attached.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/search", get(handle_search_form))
        .route(
            "/search/results",
            get(handle_results_query).post(handle_results_form),
        )
        .route("/search/suggestions", get(handle_suggestions))
        .route("/search/history", get(handle_history))
        .route("/search/history/clear", post(handle_clear_history))
        .route("/classifications", get(handle_classifications))
        .route("/inventory", get(handle_inventory))
        .route(
            "/inventory/classification/{id}",
            get(handle_by_classification),
        )
        .route("/inventory/detail/{id}", get(handle_detail))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` against the configured
/// SQLite database. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let store = SqliteStore::open(config).await?;
    let app = router(AppState::new(config.clone(), Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

// ============ Requester extraction ============

/// Client address and user agent, both optional.
///
/// The address comes from the first `X-Forwarded-For` hop when present,
/// otherwise from the socket peer.
pub struct ClientInfo(pub Requester);

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let client_addr = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(ClientInfo(Requester {
            client_addr,
            user_agent,
        }))
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /search ============

/// Data for rendering the search form.
#[derive(Serialize)]
struct SearchFormResponse {
    params: RawSearchParams,
    /// Messages from a rejected submission, in order.
    errors: Vec<String>,
    #[serde(flatten)]
    metadata: FilterMetadata,
}

async fn handle_search_form(
    State(state): State<AppState>,
    Query(params): Query<RawSearchParams>,
    RawQuery(raw): RawQuery,
) -> Result<Json<SearchFormResponse>, AppError> {
    let errors = raw
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(k, _)| k == "error")
                .map(|(_, v)| v.into_owned())
                .collect()
        })
        .unwrap_or_default();

    let metadata = form_metadata(&*state.store, state.config.search.query_timeout()).await?;

    Ok(Json(SearchFormResponse {
        params,
        errors,
        metadata,
    }))
}

// ============ /search/results ============

async fn handle_results_query(
    State(state): State<AppState>,
    ClientInfo(requester): ClientInfo,
    Query(params): Query<RawSearchParams>,
) -> Result<Response, AppError> {
    run_results(state, requester, params).await
}

async fn handle_results_form(
    State(state): State<AppState>,
    ClientInfo(requester): ClientInfo,
    Form(params): Form<RawSearchParams>,
) -> Result<Response, AppError> {
    run_results(state, requester, params).await
}

async fn run_results(
    state: AppState,
    requester: Requester,
    params: RawSearchParams,
) -> Result<Response, AppError> {
    match search_page(&*state.store, &params, state.config.search.query_timeout()).await {
        Ok(page) => {
            tracing::debug!(
                query = %params.q,
                results = page.results_count,
                "search executed"
            );
            record_detached(
                state.store.clone(),
                page.applied.clone(),
                page.results_count,
                requester,
            );
            Ok(Json(page).into_response())
        }
        Err(AppError::Validation(e)) => {
            tracing::debug!("search rejected: {}", e);
            Ok(Redirect::to(&error_redirect(&e.messages)).into_response())
        }
        Err(e) => Err(e),
    }
}

/// `/search` with one `error` pair per message.
fn error_redirect(messages: &[String]) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for message in messages {
        query.append_pair("error", message);
    }
    format!("/search?{}", query.finish())
}

// ============ GET /search/suggestions ============

#[derive(Deserialize)]
struct SuggestionQuery {
    #[serde(default)]
    q: String,
}

/// Never fails; any store problem yields an empty list.
async fn handle_suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> Json<Vec<String>> {
    let found = bounded(
        state.config.search.query_timeout(),
        "suggestions",
        motorlot_core::search::suggestions(
            &*state.store,
            &query.q,
            state.config.search.suggestion_limit,
        ),
    )
    .await;

    match found {
        Ok(suggestions) => Json(suggestions),
        Err(e) => {
            tracing::warn!(query = %query.q, "suggestions failed: {:#}", e);
            Json(Vec::new())
        }
    }
}

// ============ history ============

async fn handle_history(State(state): State<AppState>) -> Result<Json<HistoryPage>, AppError> {
    let search = &state.config.search;
    let page = history_page(
        &*state.store,
        search.history_limit,
        search.popular_limit,
        search.query_timeout(),
    )
    .await?;
    Ok(Json(page))
}

#[derive(Serialize)]
struct ClearResponse {
    deleted: u64,
}

async fn handle_clear_history(
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>, AppError> {
    let deleted = bounded(
        state.config.search.query_timeout(),
        "history clear",
        state.store.clear_history(),
    )
    .await?;
    tracing::info!(deleted, "search history cleared");
    Ok(Json(ClearResponse { deleted }))
}

// ============ inventory ============

async fn handle_classifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Classification>>, AppError> {
    let classes = bounded(
        state.config.search.query_timeout(),
        "classification list",
        state.store.classifications(),
    )
    .await?;
    Ok(Json(classes))
}

async fn handle_inventory(
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleListing>>, AppError> {
    let vehicles = bounded(
        state.config.search.query_timeout(),
        "inventory list",
        state.store.list_vehicles(),
    )
    .await?;
    Ok(Json(vehicles))
}

async fn handle_by_classification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<VehicleListing>>, AppError> {
    let vehicles = bounded(
        state.config.search.query_timeout(),
        "classification inventory",
        state.store.vehicles_by_classification(id),
    )
    .await?;
    Ok(Json(vehicles))
}

async fn handle_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VehicleListing>, AppError> {
    bounded(
        state.config.search.query_timeout(),
        "vehicle lookup",
        state.store.vehicle_by_id(id),
    )
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("vehicle {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_redirect_encodes_every_message() {
        let target = error_redirect(&[
            "Minimum price must be a valid number".to_string(),
            "Maximum year must be a valid number".to_string(),
        ]);
        assert_eq!(
            target,
            "/search?error=Minimum+price+must+be+a+valid+number\
             &error=Maximum+year+must+be+a+valid+number"
        );

        let decoded: Vec<String> = url::form_urlencoded::parse(
            target.trim_start_matches("/search?").as_bytes(),
        )
        .map(|(_, v)| v.into_owned())
        .collect();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0], "Minimum price must be a valid number");
    }
}

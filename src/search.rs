//! Search service: validation, concurrent execution, and CLI output.
//!
//! The algorithm lives in `motorlot_core::search`; this module wires it to a
//! store, bounds every store call with the configured timeout, and runs the
//! search alongside the form-metadata queries so one request costs the
//! slowest query rather than the sum of all of them.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Serialize;

use motorlot_core::models::VehicleListing;
use motorlot_core::ranges::{self, FilterMetadata};
use motorlot_core::store::InventoryStore;
use motorlot_core::{RawSearchParams, SearchParameters};

use crate::config::Config;
use crate::error::AppError;
use crate::sqlite_store::SqliteStore;

/// Everything a results view needs.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub results: Vec<VehicleListing>,
    pub results_count: usize,
    /// Parameters exactly as submitted, for re-populating the form.
    pub params: RawSearchParams,
    /// The typed filters that were applied.
    pub applied: SearchParameters,
    #[serde(flatten)]
    pub metadata: FilterMetadata,
}

/// Await `fut`, failing if it takes longer than `limit`.
pub async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| anyhow!("{} timed out after {}s", what, limit.as_secs()))?
}

/// Classifications, colors, and the three range bounds, fetched concurrently.
pub async fn form_metadata<S: InventoryStore + ?Sized>(
    store: &S,
    limit: Duration,
) -> Result<FilterMetadata> {
    let (classifications, colors, year_range, price_range, mileage_range) = tokio::try_join!(
        bounded(limit, "classification list", store.classifications()),
        bounded(limit, "color list", store.distinct_colors()),
        bounded(limit, "year range", ranges::year_range(store)),
        bounded(limit, "price range", ranges::price_range(store)),
        bounded(limit, "mileage range", ranges::mileage_range(store)),
    )?;

    Ok(FilterMetadata {
        classifications,
        colors,
        year_range,
        price_range,
        mileage_range,
    })
}

/// Validate `raw`, then run the search and the metadata queries together.
///
/// Validation failures return [`AppError::Validation`] without touching the
/// store.
pub async fn search_page<S: InventoryStore + ?Sized>(
    store: &S,
    raw: &RawSearchParams,
    limit: Duration,
) -> Result<SearchPage, AppError> {
    let applied = raw.parse()?;

    let (results, metadata) = tokio::try_join!(
        bounded(
            limit,
            "vehicle search",
            motorlot_core::search::search(store, &applied)
        ),
        form_metadata(store, limit),
    )?;

    Ok(SearchPage {
        results_count: results.len(),
        results,
        params: raw.clone(),
        applied,
        metadata,
    })
}

/// CLI entry point: validate, search, print.
pub async fn run_search(config: &Config, raw: &RawSearchParams) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let outcome = search_page(&store, raw, config.search.query_timeout()).await;
    store.close().await;

    let page = match outcome {
        Ok(page) => page,
        Err(AppError::Validation(e)) => {
            for message in &e.messages {
                eprintln!("Error: {}", message);
            }
            anyhow::bail!("search parameters rejected");
        }
        Err(e) => return Err(anyhow!(e)),
    };

    if page.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!("{} result(s)", page.results_count);
    println!();
    for (i, v) in page.results.iter().enumerate() {
        println!("{}. {} [{}]", i + 1, v.title(), v.classification_name);
        println!(
            "    price: ${:.2}  miles: {}  color: {}",
            v.price,
            v.miles,
            v.color.as_deref().unwrap_or("-")
        );
        println!("    id: {}", v.id);
    }

    Ok(())
}

/// CLI entry point for autocomplete suggestions.
pub async fn run_suggest(config: &Config, query: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let outcome = bounded(
        config.search.query_timeout(),
        "suggestions",
        motorlot_core::search::suggestions(&store, query, config.search.suggestion_limit),
    )
    .await;
    store.close().await;

    for s in outcome? {
        println!("{}", s);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorlot_core::models::NewVehicle;
    use motorlot_core::store::memory::InMemoryStore;

    async fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        let sedan = store.add_classification("Sedan").await.unwrap();
        store
            .add_vehicle(&NewVehicle {
                make: "Toyota".to_string(),
                model: "Camry".to_string(),
                year: 2022,
                description: "Comfortable and reliable sedan with modern features.".to_string(),
                image: String::new(),
                thumbnail: String::new(),
                price: 27999.0,
                miles: 12000,
                color: Some("Black".to_string()),
                classification_id: sedan,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_search_page_carries_metadata() {
        let store = store().await;
        let raw = RawSearchParams {
            q: "camry".to_string(),
            ..Default::default()
        };
        let page = search_page(&store, &raw, Duration::from_secs(5)).await.unwrap();
        assert_eq!(page.results_count, 1);
        assert_eq!(page.params, raw);
        assert_eq!(page.metadata.colors, vec!["Black"]);
        assert_eq!(page.metadata.year_range.minimum, 2022);
        assert_eq!(page.metadata.classifications.len(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_short_circuits() {
        let store = store().await;
        let raw = RawSearchParams {
            min_price: "abc".to_string(),
            ..Default::default()
        };
        match search_page(&store, &raw, Duration::from_secs(5)).await {
            Err(AppError::Validation(e)) => {
                assert_eq!(e.messages, vec!["Minimum price must be a valid number"]);
            }
            other => panic!("expected validation error, got {:?}", other.map(|p| p.results_count)),
        }
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, anyhow::Error>(1)
        };
        let err = bounded(Duration::from_millis(10), "slow query", slow)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("slow query timed out"));
    }
}

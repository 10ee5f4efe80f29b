//! Search history records.
//!
//! Builds the [`NewSearchHistory`] row for an executed search. Persisting it
//! is the caller's business and must never affect the search response.

use anyhow::Result;

use crate::models::NewSearchHistory;
use crate::params::SearchParameters;

/// Who asked. Both fields are best-effort.
#[derive(Debug, Clone, Default)]
pub struct Requester {
    pub client_addr: Option<String>,
    pub user_agent: Option<String>,
}

/// Build the history row for a search that returned `results_count` hits.
///
/// The filter snapshot is the JSON form of the typed parameters, so it
/// records what was actually applied rather than what was typed.
pub fn history_entry(
    params: &SearchParameters,
    results_count: usize,
    requester: &Requester,
) -> Result<NewSearchHistory> {
    Ok(NewSearchHistory {
        query: params.query.clone().unwrap_or_default(),
        filters_json: serde_json::to_string(params)?,
        results_count: results_count as i64,
        client_addr: requester.client_addr.clone(),
        user_agent: requester.user_agent.clone(),
    })
}

/// Format a Unix timestamp as ISO 8601.
pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

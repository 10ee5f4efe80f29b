//! Search history: detached recording, the history view, and CLI commands.
//!
//! Recording is best-effort. [`record_detached`] spawns the write onto the
//! runtime and returns immediately; a failed write is logged and dropped, it
//! never reaches the search response.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tokio::task::JoinHandle;

use motorlot_core::history::{history_entry, Requester};
use motorlot_core::models::{HistoryStats, PopularQuery, SearchHistoryEntry};
use motorlot_core::store::HistoryStore;
use motorlot_core::SearchParameters;

use crate::config::Config;
use crate::search::bounded;
use crate::sqlite_store::SqliteStore;

/// Record an executed search without waiting for the write.
///
/// The returned handle is only useful to tests; request handlers drop it.
pub fn record_detached<H>(
    store: Arc<H>,
    params: SearchParameters,
    results_count: usize,
    requester: Requester,
) -> JoinHandle<()>
where
    H: HistoryStore + ?Sized + 'static,
{
    tokio::spawn(async move {
        let entry = match history_entry(&params, results_count, &requester) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("search history not recorded: {:#}", e);
                return;
            }
        };
        match store.append_search(&entry).await {
            Ok(id) => tracing::debug!(id, query = %entry.query, "search history recorded"),
            Err(e) => tracing::warn!(query = %entry.query, "search history not recorded: {:#}", e),
        }
    })
}

/// Recent searches, aggregate stats, and popular queries.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub recent: Vec<SearchHistoryEntry>,
    pub stats: HistoryStats,
    pub popular: Vec<PopularQuery>,
}

pub async fn history_page<H: HistoryStore + ?Sized>(
    store: &H,
    recent_limit: i64,
    popular_limit: i64,
    timeout: Duration,
) -> Result<HistoryPage> {
    let (recent, stats, popular) = tokio::try_join!(
        bounded(timeout, "recent searches", store.recent_searches(recent_limit)),
        bounded(timeout, "search stats", store.search_stats()),
        bounded(timeout, "popular searches", store.popular_searches(popular_limit)),
    )?;
    Ok(HistoryPage {
        recent,
        stats,
        popular,
    })
}

/// CLI entry point: print recent searches and the summary.
pub async fn run_history(config: &Config, limit: Option<i64>) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let outcome = history_page(
        &store,
        limit.unwrap_or(config.search.history_limit),
        config.search.popular_limit,
        config.search.query_timeout(),
    )
    .await;
    store.close().await;
    let page = outcome?;

    println!("Searches:       {}", page.stats.total_searches);
    println!("Unique queries: {}", page.stats.unique_queries);
    match page.stats.avg_results {
        Some(avg) => println!("Avg results:    {:.1}", avg),
        None => println!("Avg results:    -"),
    }
    println!(
        "Last search:    {}",
        page.stats.last_search.as_deref().unwrap_or("never")
    );

    if !page.popular.is_empty() {
        println!();
        println!("Popular:");
        for p in &page.popular {
            println!("  {:>4}  {}", p.search_count, p.query);
        }
    }

    if !page.recent.is_empty() {
        println!();
        println!("Recent:");
        for e in &page.recent {
            let query = if e.query.is_empty() { "(no text)" } else { &e.query };
            println!(
                "  {}  {}  ({} results)",
                e.searched_at, query, e.results_count
            );
        }
    }

    Ok(())
}

/// CLI entry point: delete every history row.
pub async fn run_clear(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let outcome = store.clear_history().await;
    store.close().await;
    let deleted = outcome?;
    println!("Cleared {} search history entries.", deleted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use motorlot_core::models::NewSearchHistory;
    use motorlot_core::store::memory::InMemoryStore;

    struct BrokenHistory;

    #[async_trait]
    impl HistoryStore for BrokenHistory {
        async fn append_search(&self, _entry: &NewSearchHistory) -> Result<i64> {
            anyhow::bail!("history table is locked")
        }
        async fn recent_searches(&self, _limit: i64) -> Result<Vec<SearchHistoryEntry>> {
            Ok(Vec::new())
        }
        async fn search_stats(&self) -> Result<HistoryStats> {
            Ok(HistoryStats::default())
        }
        async fn popular_searches(&self, _limit: i64) -> Result<Vec<PopularQuery>> {
            Ok(Vec::new())
        }
        async fn clear_history(&self) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_record_detached_persists() {
        let store = Arc::new(InMemoryStore::new());
        let params = SearchParameters::text_only("camry");
        record_detached(store.clone(), params, 1, Requester::default())
            .await
            .unwrap();

        let recent = store.recent_searches(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].query, "camry");
        assert_eq!(recent[0].results_count, 1);
    }

    #[tokio::test]
    async fn test_record_failure_is_swallowed() {
        let handle = record_detached(
            Arc::new(BrokenHistory),
            SearchParameters::default(),
            0,
            Requester::default(),
        );
        // The task completes normally even though the write failed.
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn test_history_page() {
        let store = InMemoryStore::new();
        for q in ["camry", "camry", "f-150"] {
            let entry = history_entry(&SearchParameters::text_only(q), 2, &Requester::default())
                .unwrap();
            store.append_search(&entry).await.unwrap();
        }

        let page = history_page(&store, 2, 10, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(page.recent.len(), 2);
        assert_eq!(page.stats.total_searches, 3);
        assert_eq!(page.stats.unique_queries, 2);
        assert_eq!(page.popular[0].query, "camry");
        assert_eq!(page.popular[0].search_count, 2);
    }
}

//! Faceted vehicle search.
//!
//! [`search`] is the executor every frontend (CLI, HTTP) delegates to. It
//! operates entirely through the [`InventoryStore`] trait:
//!
//! 1. Build the predicate list from validated [`SearchParameters`].
//! 2. Ask the store for every vehicle matching all predicates.
//! 3. Order by make, then model. The sort is stable, so ties keep the
//!    store's id order.
//!
//! There is no limit or pagination; the full match set is returned.

use anyhow::Result;

use crate::filter::build_predicates;
use crate::models::VehicleListing;
use crate::params::SearchParameters;
use crate::store::InventoryStore;

/// Queries shorter than this (in characters, after trimming) get no
/// suggestions.
pub const MIN_SUGGESTION_CHARS: usize = 2;

/// Run a search against an [`InventoryStore`].
pub async fn search<S: InventoryStore + ?Sized>(
    store: &S,
    params: &SearchParameters,
) -> Result<Vec<VehicleListing>> {
    let predicates = build_predicates(params);
    let mut results = store.search_vehicles(&predicates).await?;
    results.sort_by(|a, b| a.make.cmp(&b.make).then_with(|| a.model.cmp(&b.model)));
    Ok(results)
}

/// Autocomplete strings for a partial query.
///
/// Runs a text-only search, then offers each hit's make, model, year,
/// `"make model"` and `"year make model"`, de-duplicated in first-seen order
/// and kept only when they contain the query (case-insensitive).
pub async fn suggestions<S: InventoryStore + ?Sized>(
    store: &S,
    query: &str,
    limit: usize,
) -> Result<Vec<String>> {
    let query = query.trim();
    if query.chars().count() < MIN_SUGGESTION_CHARS {
        return Ok(Vec::new());
    }

    let hits = search(store, &SearchParameters::text_only(query)).await?;
    let needle = query.to_lowercase();

    let mut out: Vec<String> = Vec::new();
    for v in &hits {
        let candidates = [
            v.make.clone(),
            v.model.clone(),
            v.year.to_string(),
            format!("{} {}", v.make, v.model),
            format!("{} {} {}", v.year, v.make, v.model),
        ];
        for c in candidates {
            if !out.contains(&c) && c.to_lowercase().contains(&needle) {
                out.push(c);
            }
        }
    }
    out.truncate(limit);
    Ok(out)
}

//! In-memory store implementation for tests and embedding.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Searches are a linear scan that
//! evaluates each [`Predicate`] directly.

use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::filter::{matches_all, Predicate};
use crate::history::format_ts_iso;
use crate::models::{
    Classification, HistoryStats, NewSearchHistory, NewVehicle, PopularQuery,
    SearchHistoryEntry, VehicleListing,
};

use super::{HistoryStore, InventoryStore};

struct StoredVehicle {
    id: i64,
    vehicle: NewVehicle,
}

struct StoredSearch {
    id: i64,
    entry: NewSearchHistory,
    searched_at: i64,
}

/// In-memory inventory and history.
pub struct InMemoryStore {
    classifications: RwLock<Vec<Classification>>,
    vehicles: RwLock<Vec<StoredVehicle>>,
    history: RwLock<Vec<StoredSearch>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            classifications: RwLock::new(Vec::new()),
            vehicles: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
        }
    }

    fn listing(&self, stored: &StoredVehicle, classes: &[Classification]) -> VehicleListing {
        let v = &stored.vehicle;
        let classification_name = classes
            .iter()
            .find(|c| c.id == v.classification_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        VehicleListing {
            id: stored.id,
            make: v.make.clone(),
            model: v.model.clone(),
            year: v.year,
            description: v.description.clone(),
            image: v.image.clone(),
            thumbnail: v.thumbnail.clone(),
            price: v.price,
            miles: v.miles,
            color: v.color.clone(),
            classification_id: v.classification_id,
            classification_name,
        }
    }

    /// Listings passing `keep`, in make/model/id order.
    fn collect<F>(&self, keep: F) -> Result<Vec<VehicleListing>>
    where
        F: Fn(&VehicleListing) -> bool,
    {
        let classes = read(&self.classifications)?;
        let vehicles = read(&self.vehicles)?;
        let mut out: Vec<VehicleListing> = vehicles
            .iter()
            .map(|sv| self.listing(sv, &classes))
            .filter(|l| keep(l))
            .collect();
        out.sort_by(|a, b| {
            a.make
                .cmp(&b.make)
                .then_with(|| a.model.cmp(&b.model))
                .then(a.id.cmp(&b.id))
        });
        Ok(out)
    }

    fn bounds<T, F>(&self, field: F) -> Result<Option<(T, T)>>
    where
        T: Copy + PartialOrd,
        F: Fn(&NewVehicle) -> T,
    {
        let vehicles = read(&self.vehicles)?;
        Ok(vehicles.iter().map(|sv| field(&sv.vehicle)).fold(None, |acc, v| {
            Some(match acc {
                None => (v, v),
                Some((lo, hi)) => (
                    if v < lo { v } else { lo },
                    if v > hi { v } else { hi },
                ),
            })
        }))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn list_vehicles(&self) -> Result<Vec<VehicleListing>> {
        self.collect(|_| true)
    }

    async fn vehicles_by_classification(
        &self,
        classification_id: i64,
    ) -> Result<Vec<VehicleListing>> {
        self.collect(|l| l.classification_id == classification_id)
    }

    async fn vehicle_by_id(&self, id: i64) -> Result<Option<VehicleListing>> {
        let classes = read(&self.classifications)?;
        let vehicles = read(&self.vehicles)?;
        Ok(vehicles
            .iter()
            .find(|sv| sv.id == id)
            .map(|sv| self.listing(sv, &classes)))
    }

    async fn search_vehicles(&self, predicates: &[Predicate]) -> Result<Vec<VehicleListing>> {
        self.collect(|l| matches_all(predicates, l))
    }

    async fn year_bounds(&self) -> Result<Option<(i64, i64)>> {
        self.bounds(|v| v.year)
    }

    async fn price_bounds(&self) -> Result<Option<(f64, f64)>> {
        self.bounds(|v| v.price)
    }

    async fn mileage_bounds(&self) -> Result<Option<(i64, i64)>> {
        self.bounds(|v| v.miles)
    }

    async fn distinct_colors(&self) -> Result<Vec<String>> {
        let vehicles = read(&self.vehicles)?;
        let colors: BTreeSet<String> = vehicles
            .iter()
            .filter_map(|sv| sv.vehicle.color.clone())
            .collect();
        Ok(colors.into_iter().collect())
    }

    async fn classifications(&self) -> Result<Vec<Classification>> {
        let mut classes = read(&self.classifications)?.clone();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(classes)
    }

    async fn add_classification(&self, name: &str) -> Result<i64> {
        let mut classes = write(&self.classifications)?;
        if classes.iter().any(|c| c.name == name) {
            bail!("classification already exists: {}", name);
        }
        let id = classes.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        classes.push(Classification {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn add_vehicle(&self, vehicle: &NewVehicle) -> Result<i64> {
        if !read(&self.classifications)?
            .iter()
            .any(|c| c.id == vehicle.classification_id)
        {
            bail!("classification not found: {}", vehicle.classification_id);
        }
        let mut vehicles = write(&self.vehicles)?;
        let id = vehicles.iter().map(|sv| sv.id).max().unwrap_or(0) + 1;
        vehicles.push(StoredVehicle {
            id,
            vehicle: vehicle.clone(),
        });
        Ok(id)
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn append_search(&self, entry: &NewSearchHistory) -> Result<i64> {
        let mut history = write(&self.history)?;
        let id = history.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        history.push(StoredSearch {
            id,
            entry: entry.clone(),
            searched_at: Utc::now().timestamp(),
        });
        Ok(id)
    }

    async fn recent_searches(&self, limit: i64) -> Result<Vec<SearchHistoryEntry>> {
        let history = read(&self.history)?;
        let mut rows: Vec<&StoredSearch> = history.iter().collect();
        rows.sort_by(|a, b| b.searched_at.cmp(&a.searched_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|s| SearchHistoryEntry {
                id: s.id,
                query: s.entry.query.clone(),
                filters: serde_json::from_str(&s.entry.filters_json)
                    .unwrap_or(serde_json::json!({})),
                results_count: s.entry.results_count,
                searched_at: format_ts_iso(s.searched_at),
                client_addr: s.entry.client_addr.clone(),
                user_agent: s.entry.user_agent.clone(),
            })
            .collect())
    }

    async fn search_stats(&self) -> Result<HistoryStats> {
        let history = read(&self.history)?;
        if history.is_empty() {
            return Ok(HistoryStats::default());
        }
        let unique: BTreeSet<&str> = history.iter().map(|s| s.entry.query.as_str()).collect();
        let total_results: i64 = history.iter().map(|s| s.entry.results_count).sum();
        let last = history.iter().map(|s| s.searched_at).max();
        Ok(HistoryStats {
            total_searches: history.len() as i64,
            unique_queries: unique.len() as i64,
            avg_results: Some(total_results as f64 / history.len() as f64),
            last_search: last.map(format_ts_iso),
        })
    }

    async fn popular_searches(&self, limit: i64) -> Result<Vec<PopularQuery>> {
        let history = read(&self.history)?;
        let mut counts: Vec<PopularQuery> = Vec::new();
        for s in history.iter().filter(|s| !s.entry.query.is_empty()) {
            match counts.iter_mut().find(|p| p.query == s.entry.query) {
                Some(p) => p.search_count += 1,
                None => counts.push(PopularQuery {
                    query: s.entry.query.clone(),
                    search_count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| {
            b.search_count
                .cmp(&a.search_count)
                .then_with(|| a.query.cmp(&b.query))
        });
        counts.truncate(limit.max(0) as usize);
        Ok(counts)
    }

    async fn clear_history(&self) -> Result<u64> {
        let mut history = write(&self.history)?;
        let removed = history.len() as u64;
        history.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(make: &str, model: &str, classification_id: i64) -> NewVehicle {
        NewVehicle {
            make: make.to_string(),
            model: model.to_string(),
            year: 2020,
            description: String::new(),
            image: String::new(),
            thumbnail: String::new(),
            price: 10000.0,
            miles: 100,
            color: None,
            classification_id,
        }
    }

    fn search(query: &str, results_count: i64) -> NewSearchHistory {
        NewSearchHistory {
            query: query.to_string(),
            filters_json: "{}".to_string(),
            results_count,
            client_addr: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_add_vehicle_requires_classification() {
        let store = InMemoryStore::new();
        assert!(store.add_vehicle(&vehicle("Ford", "F-150", 1)).await.is_err());
        let id = store.add_classification("Truck").await.unwrap();
        assert!(store.add_vehicle(&vehicle("Ford", "F-150", id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_classification_rejected() {
        let store = InMemoryStore::new();
        store.add_classification("SUV").await.unwrap();
        assert!(store.add_classification("SUV").await.is_err());
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = InMemoryStore::new();
        let c = store.add_classification("Sedan").await.unwrap();
        let first = store.add_vehicle(&vehicle("Toyota", "Camry", c)).await.unwrap();
        store.add_vehicle(&vehicle("Honda", "Civic", c)).await.unwrap();
        let second = store.add_vehicle(&vehicle("Toyota", "Camry", c)).await.unwrap();

        let all = store.list_vehicles().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|v| v.id).collect();
        assert_eq!(all[0].make, "Honda");
        assert_eq!(&ids[1..], &[first, second]);
        assert_eq!(all[0].classification_name, "Sedan");
    }

    #[tokio::test]
    async fn test_bounds_empty_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.year_bounds().await.unwrap(), None);
        assert_eq!(store.price_bounds().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_history_stats_and_popular() {
        let store = InMemoryStore::new();
        store.append_search(&search("camry", 1)).await.unwrap();
        store.append_search(&search("camry", 1)).await.unwrap();
        store.append_search(&search("", 5)).await.unwrap();
        store.append_search(&search("ford", 0)).await.unwrap();

        let stats = store.search_stats().await.unwrap();
        assert_eq!(stats.total_searches, 4);
        assert_eq!(stats.unique_queries, 3);
        assert!((stats.avg_results.unwrap() - 1.75).abs() < 1e-9);

        let popular = store.popular_searches(10).await.unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0].query, "camry");
        assert_eq!(popular[0].search_count, 2);

        let recent = store.recent_searches(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "ford");

        assert_eq!(store.clear_history().await.unwrap(), 4);
        assert!(store.recent_searches(10).await.unwrap().is_empty());
        assert_eq!(store.search_stats().await.unwrap(), HistoryStats::default());
    }
}

//! Storage abstraction for Motorlot.
//!
//! [`InventoryStore`] covers vehicles and classifications, [`HistoryStore`]
//! the append-only search log. Keeping them separate lets the history write
//! run as its own unit of work, with no transaction shared with the search.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::filter::Predicate;
use crate::models::{
    Classification, HistoryStats, NewSearchHistory, NewVehicle, PopularQuery,
    SearchHistoryEntry, VehicleListing,
};

/// Read access to inventory, plus the inserts used for seeding.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_vehicles`](InventoryStore::list_vehicles) | Every vehicle, ordered by make then model |
/// | [`vehicles_by_classification`](InventoryStore::vehicles_by_classification) | Vehicles in one classification |
/// | [`vehicle_by_id`](InventoryStore::vehicle_by_id) | Single vehicle lookup |
/// | [`search_vehicles`](InventoryStore::search_vehicles) | Vehicles matching every predicate |
/// | [`year_bounds`](InventoryStore::year_bounds) | Raw min/max year, `None` when empty |
/// | [`price_bounds`](InventoryStore::price_bounds) | Raw min/max price |
/// | [`mileage_bounds`](InventoryStore::mileage_bounds) | Raw min/max mileage |
/// | [`distinct_colors`](InventoryStore::distinct_colors) | Sorted non-null colors |
/// | [`classifications`](InventoryStore::classifications) | All classifications by name |
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn list_vehicles(&self) -> Result<Vec<VehicleListing>>;

    async fn vehicles_by_classification(&self, classification_id: i64)
        -> Result<Vec<VehicleListing>>;

    async fn vehicle_by_id(&self, id: i64) -> Result<Option<VehicleListing>>;

    /// Every vehicle matching all `predicates`, ordered by make, then model,
    /// then id.
    async fn search_vehicles(&self, predicates: &[Predicate]) -> Result<Vec<VehicleListing>>;

    async fn year_bounds(&self) -> Result<Option<(i64, i64)>>;

    async fn price_bounds(&self) -> Result<Option<(f64, f64)>>;

    async fn mileage_bounds(&self) -> Result<Option<(i64, i64)>>;

    async fn distinct_colors(&self) -> Result<Vec<String>>;

    async fn classifications(&self) -> Result<Vec<Classification>>;

    /// Insert a classification and return its id.
    async fn add_classification(&self, name: &str) -> Result<i64>;

    /// Insert a vehicle and return its id.
    async fn add_vehicle(&self, vehicle: &NewVehicle) -> Result<i64>;
}

/// The search history log.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one entry and return its id.
    async fn append_search(&self, entry: &NewSearchHistory) -> Result<i64>;

    /// Most recent entries first.
    async fn recent_searches(&self, limit: i64) -> Result<Vec<SearchHistoryEntry>>;

    async fn search_stats(&self) -> Result<HistoryStats>;

    /// Non-empty queries by descending frequency.
    async fn popular_searches(&self, limit: i64) -> Result<Vec<PopularQuery>>;

    /// Delete every entry, returning how many were removed.
    async fn clear_history(&self) -> Result<u64>;
}

//! Inventory and search-history data types.
//!
//! These are the records every store returns. Vehicles are always read
//! joined with their classification name, as [`VehicleListing`].

use serde::Serialize;

/// A vehicle category such as `SUV` or `Sedan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub id: i64,
    pub name: String,
}

/// Fields for a vehicle that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
    pub year: i64,
    pub description: String,
    pub image: String,
    pub thumbnail: String,
    pub price: f64,
    pub miles: i64,
    pub color: Option<String>,
    pub classification_id: i64,
}

/// A stored vehicle enriched with its classification's display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleListing {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub description: String,
    pub image: String,
    pub thumbnail: String,
    pub price: f64,
    pub miles: i64,
    pub color: Option<String>,
    pub classification_id: i64,
    pub classification_name: String,
}

impl VehicleListing {
    /// `"2022 Toyota Camry"`.
    pub fn title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

/// A search about to be appended to history.
#[derive(Debug, Clone)]
pub struct NewSearchHistory {
    pub query: String,
    /// JSON snapshot of the typed filter set.
    pub filters_json: String,
    pub results_count: i64,
    pub client_addr: Option<String>,
    pub user_agent: Option<String>,
}

/// One executed search, as stored.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHistoryEntry {
    pub id: i64,
    pub query: String,
    pub filters: serde_json::Value,
    pub results_count: i64,
    /// ISO 8601, UTC.
    pub searched_at: String,
    pub client_addr: Option<String>,
    pub user_agent: Option<String>,
}

/// Aggregate figures over the whole history table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total_searches: i64,
    pub unique_queries: i64,
    pub avg_results: Option<f64>,
    pub last_search: Option<String>,
}

/// A non-empty query and how many times it was run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularQuery {
    pub query: String,
    pub search_count: i64,
}

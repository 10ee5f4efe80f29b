//! # Motorlot Core
//!
//! Storage-agnostic logic for Motorlot: inventory models, search parameter
//! validation, filter predicates, the store traits, range metadata, and the
//! search algorithm itself.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Backends implement [`store::InventoryStore`] and [`store::HistoryStore`];
//! an in-memory implementation ships in [`store::memory`].
//!
//! ## Search pipeline
//!
//! ```text
//! RawSearchParams ──validate──▶ SearchParameters ──build──▶ Vec<Predicate>
//!                                                              │
//!                                     InventoryStore::search_vehicles
//!                                                              ▼
//!                                               Vec<VehicleListing> (make, model)
//! ```

pub mod filter;
pub mod history;
pub mod models;
pub mod params;
pub mod ranges;
pub mod search;
pub mod store;

pub use filter::{build_predicates, Predicate};
pub use params::{
    validate, ClassificationFilter, ColorFilter, RawSearchParams, SearchParameters,
    ValidationError,
};

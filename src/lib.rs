//! # Motorlot
//!
//! Faceted search over a vehicle dealership's inventory, served over HTTP
//! and from the `lot` CLI.
//!
//! The search algorithm, validation, and store traits live in
//! [`motorlot_core`]; this crate adds the SQLite store, configuration, the
//! service layer, and the frontends.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │   CLI    │──▶│   search /   │──▶│ SqliteStore  │
//! │  (lot)   │   │   history    │   │  (sqlx, WAL) │
//! └──────────┘   │   services   │   └──────────────┘
//! ┌──────────┐   │              │          ▲
//! │   HTTP   │──▶│              │──spawn───┘ history writes
//! │  (axum)  │   └──────────────┘
//! └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lot init                       # create and seed the database
//! lot search --q camry
//! lot search --min-price 20000 --max-price 30000
//! lot serve                      # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations and sample data |
//! | [`sqlite_store`] | SQLite implementation of the store traits |
//! | [`search`] | Search service and CLI output |
//! | [`history`] | Search history recording and reporting |
//! | [`error`] | Error taxonomy and HTTP mapping |
//! | [`server`] | HTTP server |

pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod migrate;
pub mod search;
pub mod server;
pub mod sqlite_store;

pub use motorlot_core;

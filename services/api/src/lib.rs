//! Ride Ledger HTTP API: ride records, earnings aggregation and the
//! account endpoints, served with axum.
//!
//! The binary in `main.rs` wires a storage backend into [`AppState`] and
//! serves [`create_router`]. Tests build the same router over the
//! in-memory stores.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

pub use config::{Settings, StorageBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

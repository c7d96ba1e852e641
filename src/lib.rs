//! Atelier Commerce
//!
//! Variant-aware product catalog with purchase-gated reviews and monthly
//! sales analytics.
//!
//! ## Components
//! - Catalog store: products expanded into size×color SKUs at creation
//! - Purchase ledger: read-only completed-order lookups
//! - Review gate: one review per (user, SKU), completed purchase required
//! - Sales aggregator and search-popularity tracker

pub mod auth;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod models;
pub mod reviews;
pub mod routes;
pub mod stats;
pub mod storage;

pub use error::{ShopError, ShopResult};
pub use routes::AppState;

//! Financial Data Extractor
//!
//! Aggregates financial account data (accounts, balances, transactions)
//! from a remote open-finance provider under a per-user consent model
//! and returns a single consolidated document:
//! - Provisions a dynamic API client and obtains a consent grant
//! - Fetches paginated resources with bounded retry and linear backoff
//! - Assembles heterogeneous partial payloads into one response
//! - Caches results per user document with a TTL
//!
//! PIPELINE:
//! CACHE CHECK → CONSENT → ACCOUNTS → BALANCES → TRANSACTIONS → ASSEMBLE → CACHE WRITE

pub mod cache;
pub mod client;
pub mod config;
pub mod consent;
pub mod error;
pub mod extraction;
pub mod integration;
pub mod models;
pub mod retry;
pub mod router;
pub mod routes;

pub use error::Result;

// Re-export common types
pub use models::*;

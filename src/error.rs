//! Error types for the extraction pipeline

use thiserror::Error;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractionError>;

#[derive(Error, Debug)]
pub enum ExtractionError {

    // =============================
    // Validation / Configuration
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // Transport
    // =============================

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // =============================
    // Cache (always absorbed by the store, never propagated)
    // =============================

    #[error("Cache error: {0}")]
    Cache(String),

    // =============================
    // Domain
    // =============================

    #[error("Failed to create client: {0}")]
    Client(String),

    #[error("Failed to obtain consent: {0}")]
    Consent(String),

    #[error("Failed to extract accounts: {0}")]
    Accounts(String),

    #[error("Failed to extract balances: {0}")]
    Balances(String),

    #[error("Failed to extract transactions: {0}")]
    Transactions(String),
}

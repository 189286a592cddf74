//! Environment-driven configuration
//!
//! Read once at startup and passed into the components that need it;
//! nothing here is consulted ambiently.

use std::env;
use std::time::Duration;

use crate::error::ExtractionError;
use crate::Result;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF_SECS: u64 = 1;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Root URL of the open-finance provider
    pub api_base_url: String,
    /// Total outbound time budget for one routed call, across all attempts
    pub api_timeout: Duration,
    /// Retries on top of the initial attempt
    pub retry_attempts: u32,
    /// Linear backoff increment between attempts
    pub retry_backoff: Duration,
    /// Default TTL for cache writes
    pub cache_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_base_url: env::var("OFDA_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_timeout: Duration::from_secs(parse_var(
                "OFDA_API_TIMEOUT",
                DEFAULT_API_TIMEOUT_SECS,
            )?),
            retry_attempts: parse_var("OFDA_API_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?,
            retry_backoff: Duration::from_secs(parse_var(
                "OFDA_API_RETRY_BACKOFF",
                DEFAULT_RETRY_BACKOFF_SECS,
            )?),
            cache_ttl: Duration::from_secs(parse_var(
                "CACHE_DEFAULT_TIMEOUT",
                DEFAULT_CACHE_TTL_SECS,
            )?),
        })
    }

    /// Per-request timeout, derived by splitting the total time budget
    /// across every attempt the retry policy may make.
    pub fn attempt_timeout(&self) -> Duration {
        self.api_timeout / (self.retry_attempts + 1)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff: Duration::from_secs(DEFAULT_RETRY_BACKOFF_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| {
            ExtractionError::Config(format!("invalid value for {}: {}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

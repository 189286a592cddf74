//! Core data models for the extraction pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Currency used when an account has no known balance
pub const FALLBACK_CURRENCY: &str = "BRL";

/// Consent status required before its delegated token is usable
pub const CONSENT_STATUS_APPROVED: &str = "APPROVED";

//
// ================= Client =================
//

/// A provisioned API client identity. The token is a bearer credential
/// used to request consents; no expiry is tracked for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub id: String,
    pub name: String,
    pub token: String,
    pub organization_name: String,
    pub organization_type: String,
}

//
// ================= Consent =================
//

/// A provider-side grant authorizing access to a user's account data.
/// Its token is the delegated credential for all account, balance and
/// transaction calls, distinct from the client's own token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consent {
    pub id: String,
    pub dynamic_client_id: String,
    pub status: String,
    pub token: String,
}

impl Consent {
    pub fn is_approved(&self) -> bool {
        self.status == CONSENT_STATUS_APPROVED
    }
}

//
// ================= Provider projections =================
//

fn unknown() -> String {
    "UNKNOWN".to_string()
}

/// Account as returned by the provider's paginated listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAccount {
    pub id: String,
    #[serde(default = "unknown")]
    pub account_type: String,
    #[serde(default = "unknown")]
    pub account_status: String,
}

/// Balance body from `/account/{id}/balance`
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderBalance {
    pub balance: f64,
    pub currency: String,
}

/// Transaction item from the provider's paginated listing.
/// Field names follow the provider's wire format.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTransaction {
    pub id: String,
    pub transaction_type: String,
    pub transaction_status: String,
    pub transaction_amount: f64,
    pub transaction_direction: String,
    pub transaction_description: String,
    pub transaction_date: String,
}

/// A balance joined to its account by id (a join key, not an enforced
/// foreign key)
#[derive(Debug, Clone)]
pub struct AccountBalance {
    pub account_id: String,
    pub balance: Balance,
}

/// A raw transaction tagged with the account it belongs to
#[derive(Debug, Clone)]
pub struct AccountTransaction {
    pub account_id: String,
    pub transaction: ProviderTransaction,
}

//
// ================= Extraction response =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReport {
    pub transaction_id: String,
    pub transaction_type: String,
    pub transaction_status: String,
    pub amount: f64,
    pub currency: String,
    pub direction: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

/// Account with its balance and transactions joined back on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountReport {
    pub account_id: String,
    pub account_type: String,
    pub account_status: String,
    pub balance: Balance,
    pub transactions: Vec<TransactionReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub total_accounts: usize,
    pub total_transactions: usize,
    pub processing_time_ms: u64,
    pub errors: Vec<String>,
}

/// The consolidated document returned to the boundary layer and cached
/// under the user document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub user_document: String,
    pub extraction_date: DateTime<Utc>,
    pub accounts: Vec<AccountReport>,
    pub summary: ExtractionSummary,
}

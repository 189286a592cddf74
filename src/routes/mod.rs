//! Route descriptors for the open-finance provider
//!
//! Each descriptor is an immutable value object describing one outbound
//! HTTP call: target URL, verb, headers and body. The executor stays
//! generic over the trait; nothing about transport lives here.

use serde_json::Value;

pub mod accounts;
pub mod balances;
pub mod consent;
pub mod dynamic_client;
pub mod transactions;

pub use accounts::AccountsRoute;
pub use balances::BalancesRoute;
pub use consent::ConsentRoute;
pub use dynamic_client::DynamicClientRoute;
pub use transactions::TransactionsRoute;

/// HTTP verb for a routed call. `List` is reserved and rejected by the
/// executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
    List,
}

impl std::fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Delete => "DELETE",
            RouteMethod::List => "LIST",
        };
        write!(f, "{}", s)
    }
}

/// Capability set every route descriptor implements
pub trait Route: Send + Sync {
    /// Resource name for logging
    fn name(&self) -> &'static str;

    /// Provider root URL, constant per deployment
    fn base_url(&self) -> &str;

    /// Path (and query) for GET/POST calls
    fn resource_path(&self) -> String;

    /// Path for PUT/DELETE calls; identical to `resource_path` unless a
    /// variant overrides it
    fn data_resource_path(&self) -> String {
        self.resource_path()
    }

    /// Request body; empty object for plain reads
    fn payload(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    /// `Authorization` header value when a token is available
    fn authorization_header(&self) -> Option<String> {
        None
    }

    /// Verb supplied at construction; `None` is a configuration error
    /// caught by the executor before any I/O
    fn method(&self) -> Option<RouteMethod>;
}

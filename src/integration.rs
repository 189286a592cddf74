//! Outbound call execution
//!
//! Turns a route descriptor into an actual HTTP request and a uniform
//! result envelope. Uses a long-lived `reqwest::Client` for connection
//! pooling. The `Integrator` seam keeps every service testable without a
//! live provider.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::error::ExtractionError;
use crate::routes::{Route, RouteMethod};
use crate::Result;

/// Uniform envelope for one executed call. `success` is true iff the
/// HTTP status was in the 2xx class. Owned by the call that produced it.
#[derive(Debug, Clone)]
pub struct IntegrationResult {
    pub success: bool,
    pub status: u16,
    pub body: Value,
    pub additional_data: Value,
}

impl IntegrationResult {
    pub fn ok(body: Value) -> Self {
        Self {
            success: true,
            status: 200,
            body,
            additional_data: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn failed(status: u16) -> Self {
        Self {
            success: false,
            status,
            body: Value::Object(serde_json::Map::new()),
            additional_data: Value::Object(serde_json::Map::new()),
        }
    }
}

/// Seam between the router and the transport
#[async_trait]
pub trait Integrator: Send + Sync {
    async fn execute(&self, route: &dyn Route) -> Result<IntegrationResult>;
}

/// Executes route descriptors over HTTP
pub struct HttpIntegrator {
    client: Client,
}

impl HttpIntegrator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build an integrator whose per-request timeout is the settings'
    /// per-attempt share of the total outbound budget.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.attempt_timeout())
            .build()?;
        Ok(Self { client })
    }

    /// GET/POST target the resource path; PUT/DELETE target the data
    /// resource path.
    fn target_url(route: &dyn Route, method: RouteMethod) -> String {
        let path = match method {
            RouteMethod::Put | RouteMethod::Delete => route.data_resource_path(),
            _ => route.resource_path(),
        };
        format!("{}{}", route.base_url(), path)
    }
}

#[async_trait]
impl Integrator for HttpIntegrator {
    async fn execute(&self, route: &dyn Route) -> Result<IntegrationResult> {
        let method = route.method().ok_or_else(|| {
            ExtractionError::Config(format!(
                "method cannot be none when integrating {}",
                route.name()
            ))
        })?;

        let url = Self::target_url(route, method);

        let builder = match method {
            RouteMethod::Get => self.client.get(&url),
            RouteMethod::Post => self.client.post(&url).json(&route.payload()),
            RouteMethod::Put => self.client.put(&url).json(&route.payload()),
            RouteMethod::Delete => self.client.delete(&url),
            RouteMethod::List => {
                return Err(ExtractionError::Config(format!(
                    "LIST is reserved and not executable for {}",
                    route.name()
                )))
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = route.authorization_header() {
            let value = HeaderValue::from_str(&token).map_err(|_| {
                ExtractionError::Config(format!(
                    "authorization token for {} is not a valid header value",
                    route.name()
                ))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        info!(resource = route.name(), %url, %method, "Executing request");
        // Payloads carry user documents; keep them out of info-level logs
        debug!(resource = route.name(), payload = %route.payload(), "Request payload");

        let response = builder.headers(headers).send().await.map_err(|e| {
            error!(resource = route.name(), %url, %method, error = %e, "Request failed");
            ExtractionError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                resource = route.name(),
                %url,
                %method,
                status = status.as_u16(),
                "Provider returned error status"
            );
            return Err(ExtractionError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            error!(resource = route.name(), %url, error = %e, "Failed to decode response body");
            ExtractionError::from(e)
        })?;

        Ok(IntegrationResult {
            success: status.is_success(),
            status: status.as_u16(),
            body,
            additional_data: Value::Object(serde_json::Map::new()),
        })
    }
}

/// Scripted integrator for development and testing. Responses are keyed
/// by `"{method} {resource_path}"` and consumed in order; a default per
/// key serves once its queue drains. Every executed call is recorded.
#[derive(Default)]
pub struct MockIntegrator {
    responses: Mutex<HashMap<String, VecDeque<Result<IntegrationResult>>>>,
    defaults: Mutex<HashMap<String, IntegrationResult>>,
    calls: Mutex<Vec<String>>,
}

impl MockIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(method: RouteMethod, path: &str) -> String {
        format!("{} {}", method, path)
    }

    pub fn enqueue(&self, method: RouteMethod, path: &str, result: Result<IntegrationResult>) {
        self.responses
            .lock()
            .expect("mock responses lock poisoned")
            .entry(Self::key(method, path))
            .or_default()
            .push_back(result);
    }

    pub fn enqueue_success(&self, method: RouteMethod, path: &str, body: Value) {
        self.enqueue(method, path, Ok(IntegrationResult::ok(body)));
    }

    /// Response served whenever the queue for this key is empty
    pub fn set_default(&self, method: RouteMethod, path: &str, result: IntegrationResult) {
        self.defaults
            .lock()
            .expect("mock defaults lock poisoned")
            .insert(Self::key(method, path), result);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("mock calls lock poisoned")
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock calls lock poisoned").len()
    }
}

#[async_trait]
impl Integrator for MockIntegrator {
    async fn execute(&self, route: &dyn Route) -> Result<IntegrationResult> {
        let method = route.method().ok_or_else(|| {
            ExtractionError::Config(format!(
                "method cannot be none when integrating {}",
                route.name()
            ))
        })?;

        let key = Self::key(method, &route.resource_path());
        self.calls
            .lock()
            .expect("mock calls lock poisoned")
            .push(key.clone());

        if let Some(result) = self
            .responses
            .lock()
            .expect("mock responses lock poisoned")
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
        {
            return result;
        }

        if let Some(result) = self
            .defaults
            .lock()
            .expect("mock defaults lock poisoned")
            .get(&key)
        {
            return Ok(result.clone());
        }

        Err(ExtractionError::HttpStatus {
            status: 404,
            url: key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct VerblessRoute;

    impl Route for VerblessRoute {
        fn name(&self) -> &'static str {
            "verbless"
        }
        fn base_url(&self) -> &str {
            "http://api"
        }
        fn resource_path(&self) -> String {
            "/verbless".to_string()
        }
        fn method(&self) -> Option<RouteMethod> {
            None
        }
    }

    struct ListRoute;

    impl Route for ListRoute {
        fn name(&self) -> &'static str {
            "list"
        }
        fn base_url(&self) -> &str {
            "http://api"
        }
        fn resource_path(&self) -> String {
            "/list".to_string()
        }
        fn method(&self) -> Option<RouteMethod> {
            Some(RouteMethod::List)
        }
    }

    #[tokio::test]
    async fn test_missing_method_fails_fast() {
        let integrator = HttpIntegrator::new(Client::new());
        let result = integrator.execute(&VerblessRoute).await;
        assert!(matches!(result, Err(ExtractionError::Config(_))));
    }

    #[tokio::test]
    async fn test_reserved_list_verb_is_rejected() {
        let integrator = HttpIntegrator::new(Client::new());
        let result = integrator.execute(&ListRoute).await;
        assert!(matches!(result, Err(ExtractionError::Config(_))));
    }

    #[test]
    fn test_target_url_per_verb() {
        struct SplitRoute;
        impl Route for SplitRoute {
            fn name(&self) -> &'static str {
                "split"
            }
            fn base_url(&self) -> &str {
                "http://api"
            }
            fn resource_path(&self) -> String {
                "/resource".to_string()
            }
            fn data_resource_path(&self) -> String {
                "/data-resource".to_string()
            }
            fn method(&self) -> Option<RouteMethod> {
                Some(RouteMethod::Get)
            }
        }

        let get = HttpIntegrator::target_url(&SplitRoute, RouteMethod::Get);
        assert_eq!(get, "http://api/resource");
        let put = HttpIntegrator::target_url(&SplitRoute, RouteMethod::Put);
        assert_eq!(put, "http://api/data-resource");
        let delete = HttpIntegrator::target_url(&SplitRoute, RouteMethod::Delete);
        assert_eq!(delete, "http://api/data-resource");
    }

    #[tokio::test]
    async fn test_mock_serves_in_order_then_default() {
        use crate::routes::AccountsRoute;

        let mock = MockIntegrator::new();
        mock.enqueue_success(
            RouteMethod::Get,
            "/account?page=1",
            json!({"items": [1], "has_next": false}),
        );
        mock.set_default(
            RouteMethod::Get,
            "/account?page=1",
            IntegrationResult::failed(500),
        );

        let route = AccountsRoute::new("http://api", "tok", RouteMethod::Get, None, Some(1));
        let first = mock.execute(&route).await.unwrap();
        assert!(first.success);
        let second = mock.execute(&route).await.unwrap();
        assert!(!second.success);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_unscripted_path_errors() {
        use crate::routes::AccountsRoute;

        let mock = MockIntegrator::new();
        let route = AccountsRoute::new("http://api", "tok", RouteMethod::Get, None, Some(9));
        let result = mock.execute(&route).await;
        assert!(matches!(
            result,
            Err(ExtractionError::HttpStatus { status: 404, .. })
        ));
    }
}

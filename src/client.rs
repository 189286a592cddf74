//! Dynamic client provisioning
//!
//! Obtains an API client identity for a user. Creation posts a fixed
//! organization profile with a freshly generated organization id.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::ExtractionError;
use crate::models::ClientIdentity;
use crate::router::RouterService;
use crate::routes::{DynamicClientRoute, RouteMethod};
use crate::Result;

const CLIENT_NAME: &str = "financial-data-extractor";
const ORGANIZATION_NAME: &str = "Financial Data Extractor";
const ORGANIZATION_TYPE: &str = "INDIVIDUAL";

pub struct DynamicClientService {
    router: Arc<RouterService>,
    base_url: String,
}

impl DynamicClientService {
    pub fn new(router: Arc<RouterService>, base_url: &str) -> Self {
        Self {
            router,
            base_url: base_url.to_string(),
        }
    }

    pub async fn create_client(&self, user_document: &str) -> Result<ClientIdentity> {
        let organization_id = Uuid::new_v4().to_string();
        let route = DynamicClientRoute::new(
            &self.base_url,
            RouteMethod::Post,
            CLIENT_NAME,
            ORGANIZATION_NAME,
            &organization_id,
            ORGANIZATION_TYPE,
            None,
        );

        let result = self
            .router
            .process(&route)
            .await
            .map_err(|e| ExtractionError::Client(e.to_string()))?;

        if !result.success {
            error!(user_document, status = result.status, "Client creation failed");
            return Err(ExtractionError::Client(
                "client creation failed".to_string(),
            ));
        }

        let identity: ClientIdentity = serde_json::from_value(result.body)
            .map_err(|e| ExtractionError::Client(format!("malformed client payload: {}", e)))?;

        info!(user_document, client = %identity.name, "Client created successfully");
        Ok(identity)
    }

    pub async fn get_or_create_client(&self, user_document: &str) -> Result<ClientIdentity> {
        // TODO: look up an existing client by user_document once a
        // persistence layer lands; until then every call provisions a
        // fresh client.
        self.create_client(user_document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{IntegrationResult, MockIntegrator};
    use crate::retry::RetryPolicy;
    use serde_json::json;
    use std::time::Duration;

    fn service_with(mock: Arc<MockIntegrator>) -> DynamicClientService {
        let router = Arc::new(RouterService::new(
            mock,
            RetryPolicy::new(0, Duration::from_millis(1)),
        ));
        DynamicClientService::new(router, "http://api")
    }

    #[tokio::test]
    async fn test_create_client_parses_identity() {
        let mock = Arc::new(MockIntegrator::new());
        mock.enqueue_success(
            RouteMethod::Post,
            "/dynamic-client/",
            json!({
                "id": "cli-1",
                "name": "financial-data-extractor",
                "token": "client-token",
                "organization_name": "Financial Data Extractor",
                "organization_type": "INDIVIDUAL",
            }),
        );

        let service = service_with(mock.clone());
        let identity = service.get_or_create_client("12345678901").await.unwrap();

        assert_eq!(identity.id, "cli-1");
        assert_eq!(identity.token, "client-token");
        assert_eq!(mock.calls(), vec!["POST /dynamic-client/"]);
    }

    #[tokio::test]
    async fn test_get_or_create_always_creates() {
        let mock = Arc::new(MockIntegrator::new());
        let body = json!({
            "id": "cli-1",
            "name": "financial-data-extractor",
            "token": "client-token",
            "organization_name": "Financial Data Extractor",
            "organization_type": "INDIVIDUAL",
        });
        mock.enqueue_success(RouteMethod::Post, "/dynamic-client/", body.clone());
        mock.enqueue_success(RouteMethod::Post, "/dynamic-client/", body);

        let service = service_with(mock.clone());
        service.get_or_create_client("12345678901").await.unwrap();
        service.get_or_create_client("12345678901").await.unwrap();

        // No lookup call exists; both invocations provision
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unsuccessful_result_is_a_client_error() {
        let mock = Arc::new(MockIntegrator::new());
        mock.enqueue(
            RouteMethod::Post,
            "/dynamic-client/",
            Ok(IntegrationResult::failed(422)),
        );

        let service = service_with(mock);
        let result = service.create_client("12345678901").await;
        assert!(matches!(result, Err(ExtractionError::Client(_))));
    }
}

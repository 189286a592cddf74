//! Dynamic client provisioning route: `/dynamic-client/`
//!
//! Unauthenticated; the body carries the organization profile and the
//! provider answers with the client identity and its bearer token.

use serde_json::{json, Value};

use super::{Route, RouteMethod};

pub struct DynamicClientRoute {
    base_url: String,
    operation: RouteMethod,
    name: String,
    organization_name: String,
    organization_id: String,
    organization_type: String,
    client_id: Option<String>,
}

impl DynamicClientRoute {
    pub fn new(
        base_url: &str,
        operation: RouteMethod,
        name: &str,
        organization_name: &str,
        organization_id: &str,
        organization_type: &str,
        client_id: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            operation,
            name: name.to_string(),
            organization_name: organization_name.to_string(),
            organization_id: organization_id.to_string(),
            organization_type: organization_type.to_string(),
            client_id,
        }
    }
}

impl Route for DynamicClientRoute {
    fn name(&self) -> &'static str {
        "dynamic-client"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_path(&self) -> String {
        format!("/dynamic-client/{}", self.client_id.as_deref().unwrap_or(""))
    }

    fn payload(&self) -> Value {
        json!({
            "name": self.name,
            "organization_name": self.organization_name,
            "organization_id": self.organization_id,
            "organization_type": self.organization_type,
        })
    }

    fn method(&self) -> Option<RouteMethod> {
        Some(self.operation)
    }
}

//! Consent route
//!
//! `/consent/` for listing and creation, `/consent/{id}/` when a consent
//! id is known. Creation carries the user document and client id in the
//! body; the delegated token comes back in the response.

use serde_json::{json, Value};

use super::{Route, RouteMethod};

pub struct ConsentRoute {
    base_url: String,
    token: String,
    operation: RouteMethod,
    user_document: String,
    client_id: String,
    consent_id: Option<String>,
}

impl ConsentRoute {
    pub fn new(
        base_url: &str,
        token: &str,
        operation: RouteMethod,
        user_document: &str,
        client_id: &str,
        consent_id: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            token: token.to_string(),
            operation,
            user_document: user_document.to_string(),
            client_id: client_id.to_string(),
            consent_id,
        }
    }
}

impl Route for ConsentRoute {
    fn name(&self) -> &'static str {
        "consent"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_path(&self) -> String {
        match self.consent_id.as_deref() {
            Some(id) if !id.is_empty() => format!("/consent/{}/", id),
            _ => "/consent/".to_string(),
        }
    }

    fn payload(&self) -> Value {
        json!({
            "user_document_number": self.user_document,
            "dynamic_client_id": self.client_id,
        })
    }

    fn authorization_header(&self) -> Option<String> {
        if self.token.is_empty() {
            None
        } else {
            Some(self.token.clone())
        }
    }

    fn method(&self) -> Option<RouteMethod> {
        Some(self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_path() {
        let route = ConsentRoute::new("http://api", "tok", RouteMethod::Post, "doc", "cli", None);
        assert_eq!(route.resource_path(), "/consent/");
    }

    #[test]
    fn test_single_consent_path() {
        let route = ConsentRoute::new(
            "http://api",
            "tok",
            RouteMethod::Get,
            "doc",
            "cli",
            Some("con-7".to_string()),
        );
        assert_eq!(route.resource_path(), "/consent/con-7/");
    }

    #[test]
    fn test_payload_carries_document_and_client() {
        let route = ConsentRoute::new(
            "http://api",
            "tok",
            RouteMethod::Post,
            "12345678901",
            "cli-1",
            None,
        );
        assert_eq!(
            route.payload(),
            json!({
                "user_document_number": "12345678901",
                "dynamic_client_id": "cli-1",
            })
        );
    }
}

//! Account listing route
//!
//! Paginated: `/account?page=N`. A page number always wins over an
//! account id when both are set, matching the provider's path rules.

use super::{Route, RouteMethod};

pub struct AccountsRoute {
    base_url: String,
    token: String,
    operation: RouteMethod,
    account_id: Option<String>,
    page: Option<u32>,
}

impl AccountsRoute {
    pub fn new(
        base_url: &str,
        token: &str,
        operation: RouteMethod,
        account_id: Option<String>,
        page: Option<u32>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            token: token.to_string(),
            operation,
            account_id,
            page,
        }
    }
}

impl Route for AccountsRoute {
    fn name(&self) -> &'static str {
        "accounts"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_path(&self) -> String {
        if let Some(page) = self.page {
            return format!("/account?page={}", page);
        }
        match &self.account_id {
            Some(id) => format!("/account/{}", id),
            None => "/account/".to_string(),
        }
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

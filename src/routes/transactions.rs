//! Per-account transaction listing route
//!
//! Paginated: `/account/{id}/transactions?page=N`.

use super::{Route, RouteMethod};

pub struct TransactionsRoute {
    base_url: String,
    token: String,
    operation: RouteMethod,
    account_id: String,
    page: u32,
}

impl TransactionsRoute {
    pub fn new(
        base_url: &str,
        token: &str,
        operation: RouteMethod,
        account_id: &str,
        page: u32,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            token: token.to_string(),
            operation,
            account_id: account_id.to_string(),
            page,
        }
    }
}

impl Route for TransactionsRoute {
    fn name(&self) -> &'static str {
        "transactions"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_path(&self) -> String {
        format!("/account/{}/transactions?page={}", self.account_id, self.page)
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

//! Per-account balance route: `/account/{id}/balance`, no pagination.

use super::{Route, RouteMethod};

pub struct BalancesRoute {
    base_url: String,
    token: String,
    operation: RouteMethod,
    account_id: String,
}

impl BalancesRoute {
    pub fn new(base_url: &str, token: &str, operation: RouteMethod, account_id: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            token: token.to_string(),
            operation,
            account_id: account_id.to_string(),
        }
    }
}

impl Route for BalancesRoute {
    fn name(&self) -> &'static str {
        "balances"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_path(&self) -> String {
        format!("/account/{}/balance", self.account_id)
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
    fn test_balance_path() {
        let route = BalancesRoute::new("http://api", "tok", RouteMethod::Get, "acc-9");
        assert_eq!(route.resource_path(), "/account/acc-9/balance");
        assert_eq!(route.method(), Some(RouteMethod::Get));
    }
}

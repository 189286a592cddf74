//! Router service
//!
//! The single choke point for outbound calls: every route goes through
//! the integrator under the retry policy. Only raised errors are
//! retried; a result that came back with `success == false` is handed
//! to the caller untouched.

use std::sync::Arc;

use tracing::debug;

use crate::integration::{IntegrationResult, Integrator};
use crate::retry::RetryPolicy;
use crate::routes::Route;
use crate::Result;

pub struct RouterService {
    integrator: Arc<dyn Integrator>,
    retry: RetryPolicy,
}

impl RouterService {
    pub fn new(integrator: Arc<dyn Integrator>, retry: RetryPolicy) -> Self {
        Self { integrator, retry }
    }

    pub async fn process(&self, route: &dyn Route) -> Result<IntegrationResult> {
        debug!(resource = route.name(), "Routing outbound call");
        let integrator = self.integrator.as_ref();
        self.retry.run(|| integrator.execute(route)).await
    }
}

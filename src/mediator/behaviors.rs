//! Pipeline behaviors shared by every request

use super::{BoxResponse, Next, PipelineBehavior, RequestInfo};
use crate::core::error::ApiError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Default slow-request threshold
pub const DEFAULT_SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(3000);

/// Logs every request and warns about those slower than a threshold
///
/// A request warns only when its elapsed time strictly exceeds the threshold.
#[derive(Debug)]
pub struct PerformanceLoggingBehavior {
    threshold: Duration,
    slow_requests: AtomicU64,
}

impl PerformanceLoggingBehavior {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            slow_requests: AtomicU64::new(0),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Number of requests that exceeded the threshold so far
    pub fn slow_requests(&self) -> u64 {
        self.slow_requests.load(Ordering::Relaxed)
    }

    fn is_slow(&self, elapsed_ms: u128) -> bool {
        elapsed_ms > self.threshold.as_millis()
    }
}

impl Default for PerformanceLoggingBehavior {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_REQUEST_THRESHOLD)
    }
}

#[async_trait]
impl PipelineBehavior for PerformanceLoggingBehavior {
    async fn handle(
        &self,
        request: &dyn RequestInfo,
        next: Next<'_>,
    ) -> Result<BoxResponse, ApiError> {
        let name = request.request_name();
        tracing::info!("Handling {}.", name);

        let started = Instant::now();
        let response = next.run().await;
        let elapsed_ms = started.elapsed().as_millis();

        if self.is_slow(elapsed_ms) {
            self.slow_requests.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                request = name,
                elapsed_ms = elapsed_ms as u64,
                "Long Running Request: {} ({} milliseconds).",
                name,
                elapsed_ms
            );
        }

        response
    }
}

/// Rejects requests whose validation fails, before the handler runs
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationBehavior;

#[async_trait]
impl PipelineBehavior for ValidationBehavior {
    async fn handle(
        &self,
        request: &dyn RequestInfo,
        next: Next<'_>,
    ) -> Result<BoxResponse, ApiError> {
        if let Err(errors) = request.run_validation() {
            tracing::debug!("Validation failed for {}: {}", request.request_name(), errors);
            return Err(ApiError::validation(&errors));
        }
        next.run().await
    }
}

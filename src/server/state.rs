//! Shared application state
//!
//! Everything a handler needs is resolved once at startup and shared behind
//! `Arc`s; cloning the state is cheap.

use crate::config::Environment;
use crate::core::auth::{AuthProvider, PolicyRegistry};
use crate::mediator::{Mediator, PerformanceLoggingBehavior};
use std::sync::Arc;

/// State passed to every route handler
#[derive(Clone)]
pub struct AppState {
    /// Request dispatcher
    pub mediator: Arc<Mediator>,

    /// Turns request headers into an auth context
    pub auth: Arc<dyn AuthProvider>,

    /// Named authorization policies
    pub policies: Arc<PolicyRegistry>,

    /// Slow-request tracking shared with the mediator pipeline
    pub performance: Arc<PerformanceLoggingBehavior>,

    /// Hosting environment
    pub environment: Environment,
}

//! ServerBuilder for fluent API to build the HTTP server

use super::exposure::RestExposure;
use super::middleware::{handle_panic, route_not_found};
use super::openapi;
use super::state::AppState;
use crate::config::{AppConfig, CorsSettings, Environment};
use crate::core::auth::{AuthPolicy, AuthProvider, JwtAuthProvider, PolicyRegistry};
use crate::features::build_mediator;
use crate::mediator::PerformanceLoggingBehavior;
use crate::storage::{ArticleStore, InMemoryArticleStore};
use anyhow::{Context, Result};
use axum::Router;
use axum::http::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for the article API server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(config)
///     .with_environment(Environment::Local)
///     .with_store(store)
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: AppConfig,
    environment: Environment,
    store: Option<Arc<dyn ArticleStore>>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    policies: PolicyRegistry,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with default configuration
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            environment: Environment::Production,
            store: None,
            auth_provider: None,
            policies: PolicyRegistry::default(),
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the article store; defaults to an empty in-memory store
    pub fn with_store(mut self, store: Arc<dyn ArticleStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the JWT provider built from the configuration
    pub fn with_auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth_provider = Some(Arc::new(provider));
        self
    }

    /// Register or replace a named policy
    pub fn with_policy(mut self, name: &str, policy: AuthPolicy) -> Self {
        self.policies.insert(name, policy);
        self
    }

    /// Add custom routes to the server
    ///
    /// ```ignore
    /// let extra = Router::new().route("/version", get(|| async { "1.0" }));
    ///
    /// ServerBuilder::new()
    ///     .with_config(config)
    ///     .with_custom_routes(extra)
    ///     .build()?;
    /// ```
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Resolve the shared state handed to every handler
    ///
    /// Fails when no auth provider was given and the JWT key is not configured.
    pub fn build_state(&self) -> Result<AppState> {
        let auth = match &self.auth_provider {
            Some(provider) => provider.clone(),
            None => Arc::new(
                JwtAuthProvider::new(&self.config.jwt)
                    .context("JWT bearer authentication could not be configured")?,
            ),
        };

        let store = self
            .store
            .clone()
            .unwrap_or_else(|| Arc::new(InMemoryArticleStore::new()));

        let performance = Arc::new(PerformanceLoggingBehavior::new(Duration::from_millis(
            self.config.logging.slow_request_threshold_ms,
        )));

        Ok(AppState {
            mediator: Arc::new(build_mediator(store, performance.clone())),
            auth,
            policies: Arc::new(self.policies.clone()),
            performance,
            environment: self.environment.clone(),
        })
    }

    /// Build the final router
    ///
    /// Layers, outermost first: request tracing, CORS, panic recovery.
    /// Unknown routes answer 404 with an error body.
    pub fn build(self) -> Result<Router> {
        let state = self.build_state()?;
        self.build_with_state(state)
    }

    /// Build the router around an already resolved state
    pub fn build_with_state(self, state: AppState) -> Result<Router> {
        let cors = cors_layer(&self.config.cors)?;
        let docs = openapi::router(&state.environment);

        tracing::debug!(
            "OpenAPI document served at {}",
            openapi::document_path(&state.environment)
        );

        let app = RestExposure::build_router(state, self.custom_routes)?
            .merge(docs)
            .fallback(route_not_found)
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(cors)
            .layer(TraceLayer::new_for_http());

        Ok(app)
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// CORS policy allowing the configured origins with any method and header
fn cors_layer(settings: &CorsSettings) -> Result<CorsLayer> {
    let origins = settings
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("invalid CORS origin {origin:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtSettings;
    use crate::core::auth::{ADMIN_POLICY, NoAuthProvider};

    fn config_with_key() -> AppConfig {
        AppConfig {
            jwt: JwtSettings {
                key: "unit-test-signing-key-0123456789abcdef".to_string(),
                ..JwtSettings::default()
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_new_creates_default_builder() {
        let builder = ServerBuilder::new();
        assert!(builder.store.is_none());
        assert!(builder.auth_provider.is_none());
        assert!(builder.custom_routes.is_empty());
        assert_eq!(builder.environment, Environment::Production);
        assert!(builder.policies.get(ADMIN_POLICY).is_some());
    }

    #[test]
    fn test_build_state_without_jwt_key_fails() {
        let result = ServerBuilder::new().build_state();
        let err = result.err().expect("missing key should fail");
        assert!(format!("{:#}", err).contains("JWT"));
    }

    #[test]
    fn test_build_state_with_key() {
        let state = ServerBuilder::new()
            .with_config(config_with_key())
            .with_environment(Environment::Local)
            .build_state()
            .expect("state should build");

        assert!(state.environment.is_local());
        assert_eq!(state.performance.threshold(), Duration::from_millis(3000));
    }

    #[test]
    fn test_auth_provider_override_skips_jwt_key() {
        let state = ServerBuilder::new()
            .with_auth_provider(NoAuthProvider)
            .build_state();
        assert!(state.is_ok());
    }

    #[test]
    fn test_with_policy_registers_policy() {
        let builder = ServerBuilder::new().with_policy("Access:USER", AuthPolicy::access_level("USER"));
        assert!(builder.policies.get("Access:USER").is_some());
    }

    #[test]
    fn test_with_custom_routes_appends_router() {
        let builder = ServerBuilder::new()
            .with_custom_routes(Router::new())
            .with_custom_routes(Router::new());
        assert_eq!(builder.custom_routes.len(), 2);
    }

    #[test]
    fn test_invalid_cors_origin_fails() {
        let settings = CorsSettings {
            allowed_origins: vec!["http://bad\norigin".to_string()],
        };
        assert!(cors_layer(&settings).is_err());
    }

    #[test]
    fn test_build_produces_router() {
        let router = ServerBuilder::new()
            .with_config(config_with_key())
            .build();
        assert!(router.is_ok());
    }
}

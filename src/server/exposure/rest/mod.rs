//! REST API exposure
//!
//! Produces the axum `Router` for health checks and the article endpoints
//! from an [`AppState`].

pub mod articles;

use crate::server::state::AppState;
use crate::core::auth::ADMIN_POLICY;
use crate::core::error::ApiError;
use crate::server::middleware::{PolicyGuard, require_policy};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

/// Prefix shared by every API route
pub const API_PATH: &str = "/api/";

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from the application state
    ///
    /// # Returns
    ///
    /// A router with:
    /// - Health check routes
    /// - Article routes (`/api/test/article`, `/api/articles`, `/api/articles/{id}`)
    /// - Custom routes
    pub fn build_router(state: AppState, custom_routes: Vec<Router>) -> Result<Router, ApiError> {
        let mut app = Self::health_routes().merge(Self::article_routes(&state)?);

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app)
    }

    fn article_routes(state: &AppState) -> Result<Router, ApiError> {
        let admin = state
            .policies
            .get(ADMIN_POLICY)
            .cloned()
            .ok_or_else(|| ApiError::internal(format!("Policy {ADMIN_POLICY} is not registered")))?;

        let read_routes = Router::new()
            .route(&format!("{API_PATH}test/article"), get(articles::test_article))
            .route(&format!("{API_PATH}articles"), get(articles::list_articles))
            .route(&format!("{API_PATH}articles/{{id}}"), get(articles::get_article));

        let write_routes = Router::new()
            .route(&format!("{API_PATH}articles"), post(articles::create_article))
            .route_layer(from_fn_with_state(
                PolicyGuard::new(ADMIN_POLICY, admin, state.auth.clone()),
                require_policy,
            ));

        Ok(read_routes.merge(write_routes).with_state(state.clone()))
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "articles-api"
        }))
    }
}

//! Tower/axum middleware: authorization guard and panic handling

use crate::core::auth::{AuthContext, AuthPolicy, AuthProvider};
use crate::core::error::ApiError;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::Json;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::sync::Arc;

/// A named policy together with the provider that authenticates callers
#[derive(Clone)]
pub struct PolicyGuard {
    name: Arc<str>,
    policy: AuthPolicy,
    provider: Arc<dyn AuthProvider>,
}

impl PolicyGuard {
    pub fn new(name: &str, policy: AuthPolicy, provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            name: Arc::from(name),
            policy,
            provider,
        }
    }
}

/// Authenticate the caller and enforce the guard's policy
///
/// - unusable credentials on a public route are treated as anonymous
/// - unusable or missing credentials elsewhere answer 401
/// - an authenticated caller failing the policy gets 403
///
/// On success the [`AuthContext`] is available to the handler as an extension.
pub async fn require_policy(
    State(guard): State<PolicyGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = match guard.provider.extract_context(request.headers()).await {
        Ok(context) => context,
        Err(err) if matches!(guard.policy, AuthPolicy::Public) => {
            tracing::debug!("Ignoring credentials on public route: {}", err);
            AuthContext::Anonymous
        }
        Err(err) => return Err(err.into()),
    };

    if !guard.policy.check(&context) {
        return Err(if context.is_authenticated() {
            ApiError::forbidden(format!("Access denied by policy {}", guard.name))
        } else {
            ApiError::unauthorized("Authentication required")
        });
    }

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Turn a handler panic into a 500 error body
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!("Handler panicked: {}", detail);

    // Already logged.
    let err = ApiError::internal("An unexpected error occurred.");
    (err.status_code(), Json(err.to_body())).into_response()
}

/// Answer unknown routes with a 404 error body
pub async fn route_not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::with_status(
        axum::http::StatusCode::NOT_FOUND,
        format!("No route for {}", uri.path()),
    )
}

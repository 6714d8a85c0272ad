//! Typed error handling for the articles API
//!
//! Every failure that can reach an HTTP client is an [`ApiError`]: a status
//! code, a human-readable message and an optional structured `errors` payload
//! (validation failures, for instance). On the wire it is rendered as an
//! [`ErrorBody`].
//!
//! Backend-facing failures have their own types and convert into `ApiError`:
//!
//! - [`StorageError`]: failures raised by an article store
//! - [`ConfigError`]: failures while loading configuration (startup only)
//!
//! # Example
//!
//! ```rust,ignore
//! use articles::prelude::*;
//!
//! async fn find(store: &dyn ArticleStore, id: i32) -> Result<Article, ApiError> {
//!     store
//!         .get(id)
//!         .await?
//!         .ok_or_else(|| ApiError::not_found("Article", "id", id))
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Message used when a request fails validation
pub const VALIDATION_FAILED_MESSAGE: &str = "One or more validation failures have occurred.";

/// An error carrying everything needed to answer an HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status_code: StatusCode,
    message: String,
    errors: Option<serde_json::Value>,
}

impl ApiError {
    /// Bad request (400) with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    /// Error with an explicit status code
    pub fn with_status(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            errors: None,
        }
    }

    /// Error with an explicit status code and structured details
    pub fn with_errors(
        status_code: StatusCode,
        message: impl Into<String>,
        errors: serde_json::Value,
    ) -> Self {
        Self {
            status_code,
            message: message.into(),
            errors: Some(errors),
        }
    }

    /// Not found (404) for a lookup of `entity` by `field`
    ///
    /// The message reads `{field} > ({key}) was not found in [{entity}] entity.`
    pub fn not_found(entity: &str, field: &str, key: impl fmt::Display) -> Self {
        Self::with_status(
            StatusCode::NOT_FOUND,
            format!("{field} > ({key}) was not found in [{entity}] entity."),
        )
    }

    /// Missing or invalid credentials (401)
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, message)
    }

    /// Authenticated but not allowed (403)
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, message)
    }

    /// Internal server error (500)
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Validation failure (400) with per-field details
    pub fn validation(errors: &validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(errors).unwrap_or(serde_json::Value::Null);
        Self::with_errors(StatusCode::BAD_REQUEST, VALIDATION_FAILED_MESSAGE, details)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn errors(&self) -> Option<&serde_json::Value> {
        self.errors.as_ref()
    }

    /// An `ApiError` always describes a failed operation
    pub fn succeeded(&self) -> bool {
        false
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code.is_server_error()
    }

    /// Render the wire body, stamped with the current time
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            status_code: self.status_code.as_u16(),
            message: self.message.clone(),
            error_date_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            errors: self.errors.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status_code.as_u16())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(status = self.status_code.as_u16(), "{}", self.message);
        } else {
            tracing::warn!(status = self.status_code.as_u16(), "{}", self.message);
        }

        (self.status_code, Json(self.to_body())).into_response()
    }
}

/// JSON body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// HTTP status code, repeated in the body
    pub status_code: u16,
    /// Human-readable error message
    pub message: String,
    /// RFC 3339 timestamp of when the error was produced
    pub error_date_time: String,
    /// Structured details (validation failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub errors: Option<serde_json::Value>,
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by article stores
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend could not be reached
    #[error("{backend} connection error: {message}")]
    Connection { backend: String, message: String },

    /// A query failed
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    /// Identity column overflowed
    #[error("article identifier space exhausted")]
    IdentityExhausted,

    /// A lock guarding in-memory state was poisoned
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::internal(err.to_string())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration file exists but could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid YAML
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The merged document does not match the expected shape
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_to_bad_request() {
        let err = ApiError::new("title is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "title is required");
        assert!(err.errors().is_none());
        assert!(!err.succeeded());
    }

    #[test]
    fn test_not_found_message_format() {
        let err = ApiError::not_found("Article", "id", 42);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "id > (42) was not found in [Article] entity.");
    }

    #[test]
    fn test_with_errors_keeps_details() {
        let err = ApiError::with_errors(
            StatusCode::UNPROCESSABLE_ENTITY,
            "bad payload",
            serde_json::json!({ "title": ["too long"] }),
        );
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.errors().unwrap()["title"][0], "too long");
    }

    #[test]
    fn test_body_uses_camel_case_keys() {
        let body = ApiError::internal("boom").to_body();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["message"], "boom");
        assert!(json["errorDateTime"].is_string());
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_error_date_time_is_rfc3339() {
        let body = ApiError::new("x").to_body();
        assert!(chrono::DateTime::parse_from_rfc3339(&body.error_date_time).is_ok());
    }

    #[test]
    fn test_storage_error_maps_to_500() {
        let err: ApiError = StorageError::Query {
            backend: "PostgreSQL".to_string(),
            message: "relation does not exist".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().contains("relation does not exist"));
    }

    #[test]
    fn test_into_response_sets_status() {
        let response = ApiError::forbidden("nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

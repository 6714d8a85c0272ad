//! Authentication and authorization
//!
//! Requests carry an optional `Authorization: Bearer <jwt>` header. An
//! [`AuthProvider`] turns the headers into an [`AuthContext`], and named
//! [`AuthPolicy`] values decide whether that context may reach a route.
//!
//! The JWT provider validates signature (HMAC-SHA256), issuer, audience and
//! lifetime, allowing the configured clock skew.

use crate::config::JwtSettings;
use crate::core::error::ApiError;
use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Claim holding the caller's access level
pub const ACCESS_LEVEL_CLAIM: &str = "AccessLevel";

/// Name of the administrator policy
pub const ADMIN_POLICY: &str = "Access:ADMIN";

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Every other claim (e.g. `AccessLevel`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Whether `name` equals `value`, or contains it when the claim is an array
    pub fn has_claim(&self, name: &str, value: &str) -> bool {
        match self.extra.get(name) {
            Some(Value::String(s)) => s == value,
            Some(Value::Array(items)) => items.iter().any(|item| item.as_str() == Some(value)),
            _ => false,
        }
    }
}

/// Authorization context extracted from a request
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// Caller presented a valid token
    User { subject: String, claims: Claims },

    /// No authentication (public access)
    Anonymous,
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::User { .. })
    }

    /// Subject (`sub` claim) if authenticated
    pub fn subject(&self) -> Option<&str> {
        match self {
            AuthContext::User { subject, .. } => Some(subject),
            AuthContext::Anonymous => None,
        }
    }

    pub fn has_claim(&self, name: &str, value: &str) -> bool {
        match self {
            AuthContext::User { claims, .. } => claims.has_claim(name, value),
            AuthContext::Anonymous => false,
        }
    }
}

/// Authorization policy for a route
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// Public access (no auth required)
    Public,

    /// Any authenticated caller
    Authenticated,

    /// Claim `claim` must carry `value`
    RequireClaim { claim: String, value: String },

    /// Combination of policies (AND)
    And(Vec<AuthPolicy>),

    /// Combination of policies (OR)
    Or(Vec<AuthPolicy>),
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Public => true,

            AuthPolicy::Authenticated => context.is_authenticated(),

            AuthPolicy::RequireClaim { claim, value } => context.has_claim(claim, value),

            AuthPolicy::And(policies) => policies.iter().all(|p| p.check(context)),

            AuthPolicy::Or(policies) => policies.iter().any(|p| p.check(context)),
        }
    }

    /// Authenticated caller whose `AccessLevel` claim is `level`
    pub fn access_level(level: &str) -> Self {
        AuthPolicy::And(vec![
            AuthPolicy::Authenticated,
            AuthPolicy::RequireClaim {
                claim: ACCESS_LEVEL_CLAIM.to_string(),
                value: level.to_string(),
            },
        ])
    }
}

/// Named authorization policies
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: HashMap<String, AuthPolicy>,
}

impl PolicyRegistry {
    /// Empty registry
    pub fn empty() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, policy: AuthPolicy) {
        self.policies.insert(name.into(), policy);
    }

    pub fn get(&self, name: &str) -> Option<&AuthPolicy> {
        self.policies.get(name)
    }
}

impl Default for PolicyRegistry {
    /// Registry containing the `Access:ADMIN` policy
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.insert(ADMIN_POLICY, AuthPolicy::access_level("ADMIN"));
        registry
    }
}

/// Authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header is not a bearer token")]
    MalformedHeader,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    Expired,

    #[error("no JWT signing key configured")]
    SigningKeyMissing,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::SigningKeyMissing => ApiError::internal(err.to_string()),
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Extract auth context from request headers
    ///
    /// Absent credentials yield [`AuthContext::Anonymous`]; present but
    /// unusable credentials are an error.
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError>;
}

/// Default no-auth provider (for development)
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    async fn extract_context(&self, _headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        Ok(AuthContext::Anonymous)
    }
}

/// JWT bearer provider
pub struct JwtAuthProvider {
    issuer: String,
    audience: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthProvider {
    /// Build a provider from configuration
    pub fn new(settings: &JwtSettings) -> Result<Self, AuthError> {
        if settings.key.is_empty() {
            return Err(AuthError::SigningKeyMissing);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = settings.clock_skew_secs;
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let secret = settings.key.as_bytes();
        Ok(Self {
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Issue a token for `subject` carrying `extra` claims
    pub fn issue(
        &self,
        subject: &str,
        extra: Map<String, Value>,
        expires_in: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + expires_in).timestamp(),
            iat: Some(now.timestamp()),
            extra,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Validate a raw token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(AuthContext::Anonymous);
        };

        let token = value
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or(AuthError::MalformedHeader)?;

        let claims = self.verify(token)?;
        Ok(AuthContext::User {
            subject: claims.sub.clone(),
            claims,
        })
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn settings() -> JwtSettings {
        JwtSettings {
            issuer: "test-issuer".to_string(),
            audience: "test-audience".to_string(),
            key: "0123456789abcdef0123456789abcdef".to_string(),
            clock_skew_secs: 300,
        }
    }

    fn admin_claims() -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert(ACCESS_LEVEL_CLAIM.to_string(), Value::from("ADMIN"));
        extra
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_policy_check() {
        let ctx = AuthContext::User {
            subject: "alice".to_string(),
            claims: Claims {
                sub: "alice".to_string(),
                iss: "i".to_string(),
                aud: "a".to_string(),
                exp: 0,
                iat: None,
                extra: admin_claims(),
            },
        };

        assert!(AuthPolicy::Authenticated.check(&ctx));
        assert!(AuthPolicy::access_level("ADMIN").check(&ctx));
        assert!(!AuthPolicy::access_level("AUDITOR").check(&ctx));

        let anon = AuthContext::Anonymous;
        assert!(AuthPolicy::Public.check(&anon));
        assert!(!AuthPolicy::Authenticated.check(&anon));
        assert!(!AuthPolicy::access_level("ADMIN").check(&anon));
    }

    #[test]
    fn test_policy_check_or() {
        let policy = AuthPolicy::Or(vec![AuthPolicy::Public, AuthPolicy::Authenticated]);
        assert!(policy.check(&AuthContext::Anonymous));
    }

    #[test]
    fn test_default_registry_has_admin_policy() {
        let registry = PolicyRegistry::default();
        assert!(registry.get(ADMIN_POLICY).is_some());
        assert!(registry.get("Access:NOBODY").is_none());
    }

    #[test]
    fn test_claims_array_membership() {
        let mut extra = Map::new();
        extra.insert("roles".to_string(), serde_json::json!(["reader", "writer"]));
        let claims = Claims {
            sub: "s".to_string(),
            iss: "i".to_string(),
            aud: "a".to_string(),
            exp: 0,
            iat: None,
            extra,
        };
        assert!(claims.has_claim("roles", "writer"));
        assert!(!claims.has_claim("roles", "admin"));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[test]
    fn test_provider_requires_key() {
        let settings = JwtSettings {
            key: String::new(),
            ..settings()
        };
        assert!(matches!(
            JwtAuthProvider::new(&settings),
            Err(AuthError::SigningKeyMissing)
        ));
    }

    #[test]
    fn test_issue_then_verify() {
        let provider = JwtAuthProvider::new(&settings()).unwrap();
        let token = provider
            .issue("alice", admin_claims(), Duration::minutes(10))
            .unwrap();

        let claims = provider.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(claims.has_claim(ACCESS_LEVEL_CLAIM, "ADMIN"));
    }

    #[test]
    fn test_expired_beyond_skew_is_rejected() {
        let provider = JwtAuthProvider::new(&settings()).unwrap();
        let token = provider
            .issue("alice", Map::new(), Duration::minutes(-10))
            .unwrap();

        assert!(matches!(provider.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_expired_within_skew_is_accepted() {
        let provider = JwtAuthProvider::new(&settings()).unwrap();
        let token = provider
            .issue("alice", Map::new(), Duration::minutes(-2))
            .unwrap();

        assert!(provider.verify(&token).is_ok());
    }

    fn not_before(offset: Duration) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert(
            "nbf".to_string(),
            Value::from((Utc::now() + offset).timestamp()),
        );
        extra
    }

    #[test]
    fn test_not_yet_valid_beyond_skew_is_rejected() {
        let provider = JwtAuthProvider::new(&settings()).unwrap();
        let token = provider
            .issue("alice", not_before(Duration::hours(1)), Duration::hours(2))
            .unwrap();

        assert!(matches!(
            provider.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_not_yet_valid_within_skew_is_accepted() {
        let provider = JwtAuthProvider::new(&settings()).unwrap();
        let token = provider
            .issue("alice", not_before(Duration::minutes(2)), Duration::hours(1))
            .unwrap();

        assert!(provider.verify(&token).is_ok());
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let issuer = JwtAuthProvider::new(&JwtSettings {
            audience: "someone-else".to_string(),
            ..settings()
        })
        .unwrap();
        let token = issuer.issue("alice", Map::new(), Duration::minutes(5)).unwrap();

        let provider = JwtAuthProvider::new(&settings()).unwrap();
        assert!(matches!(
            provider.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let issuer = JwtAuthProvider::new(&JwtSettings {
            key: "another-key-another-key-another!!".to_string(),
            ..settings()
        })
        .unwrap();
        let token = issuer.issue("alice", Map::new(), Duration::minutes(5)).unwrap();

        let provider = JwtAuthProvider::new(&settings()).unwrap();
        assert!(provider.verify(&token).is_err());
    }

    #[tokio::test]
    async fn test_extract_context_without_header_is_anonymous() {
        let provider = JwtAuthProvider::new(&settings()).unwrap();
        let ctx = provider
            .extract_context(&HeaderMap::new())
            .await
            .expect("extract_context should succeed");
        assert!(matches!(ctx, AuthContext::Anonymous));
    }

    #[tokio::test]
    async fn test_extract_context_with_valid_token() {
        let provider = JwtAuthProvider::new(&settings()).unwrap();
        let token = provider
            .issue("bob", admin_claims(), Duration::minutes(5))
            .unwrap();

        let ctx = provider
            .extract_context(&headers_with(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(ctx.subject(), Some("bob"));
        assert!(ctx.has_claim(ACCESS_LEVEL_CLAIM, "ADMIN"));
    }

    #[tokio::test]
    async fn test_extract_context_with_garbage_token() {
        let provider = JwtAuthProvider::new(&settings()).unwrap();
        let result = provider
            .extract_context(&headers_with("Bearer not.a.jwt"))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_extract_context_with_basic_scheme() {
        let provider = JwtAuthProvider::new(&settings()).unwrap();
        let result = provider.extract_context(&headers_with("Basic dXNlcjpwdw==")).await;
        assert!(matches!(result, Err(AuthError::MalformedHeader)));
    }

    #[tokio::test]
    async fn test_no_auth_provider_extract_context() {
        let ctx = NoAuthProvider
            .extract_context(&headers_with("Bearer whatever"))
            .await
            .unwrap();
        assert!(matches!(ctx, AuthContext::Anonymous));
    }
}

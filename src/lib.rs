//! # Articles API
//!
//! A small article web API built on axum.
//!
//! ## Features
//!
//! - **Mediator Pipeline**: HTTP handlers send typed requests through a
//!   mediator; validation and performance logging wrap every handler
//! - **JWT Bearer Auth**: HS256 tokens, named claim-based policies (`Access:ADMIN`)
//! - **OpenAPI**: generated document with a bearer security scheme
//! - **Layered Configuration**: `appsettings.yaml` + per-environment overrides
//! - **Pluggable Storage**: in-memory by default, PostgreSQL behind the `postgres` feature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use articles::prelude::*;
//!
//! let environment = Environment::from_env();
//! let config = AppConfig::load("config", &environment)?;
//! let store = connect_store(&config.database).await?;
//!
//! ServerBuilder::new()
//!     .with_config(config)
//!     .with_environment(environment)
//!     .with_store(store)
//!     .serve("127.0.0.1:8080")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod features;
pub mod logging;
pub mod mediator;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Configuration ===
    pub use crate::config::{AppConfig, Environment};

    // === Core ===
    pub use crate::core::auth::{
        ADMIN_POLICY, AuthContext, AuthPolicy, AuthProvider, JwtAuthProvider, NoAuthProvider,
        PolicyRegistry,
    };
    pub use crate::core::error::{ApiError, ErrorBody, StorageError};

    // === Mediator ===
    pub use crate::mediator::{
        Mediator, PerformanceLoggingBehavior, PipelineBehavior, Request, RequestHandler,
        ValidationBehavior,
    };

    // === Articles ===
    pub use crate::entities::{Article, ArticleListOutput, NewArticle};
    pub use crate::features::articles::{
        ArticlesQuery, CreateArticleCommand, GetArticleQuery, ListArticlesQuery,
    };

    // === Storage ===
    pub use crate::storage::{ArticleStore, InMemoryArticleStore, connect_store};

    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresArticleStore;

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === Re-exports from external crates ===
    pub use async_trait::async_trait;
    pub use axum::{Json, Router};
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}

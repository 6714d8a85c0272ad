//! PostgreSQL storage backend using sqlx.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag.
//!
//! # Schema
//!
//! Articles live in the `articles` table (`id SERIAL`, `title VARCHAR(150)`,
//! `created_dt TIMESTAMPTZ`), created on startup by [`ensure_schema`].

use super::ArticleStore;
use crate::core::error::StorageError;
use crate::entities::{Article, NewArticle};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const BACKEND: &str = "PostgreSQL";

fn query_error(e: sqlx::Error) -> StorageError {
    StorageError::Query {
        backend: BACKEND.to_string(),
        message: e.to_string(),
    }
}

/// Apply the `articles` table (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS articles (
            id SERIAL PRIMARY KEY,
            title VARCHAR(150) NOT NULL,
            created_dt TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await
    .map_err(query_error)?;

    Ok(())
}

/// Article store backed by PostgreSQL.
///
/// # Example
///
/// ```rust,ignore
/// let store = PostgresArticleStore::connect("postgres://localhost/articles", 5).await?;
/// let article = store.create(NewArticle::new("Hello")).await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresArticleStore {
    pool: PgPool,
}

impl PostgresArticleStore {
    /// Create a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, then make sure the schema exists
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection {
                backend: BACKEND.to_string(),
                message: e.to_string(),
            })?;

        ensure_schema(&pool).await?;
        tracing::info!("Connected to {} article store", BACKEND);
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ArticleStore for PostgresArticleStore {
    async fn create(&self, article: NewArticle) -> Result<Article, StorageError> {
        sqlx::query_as::<_, Article>(
            "INSERT INTO articles (title, created_dt) VALUES ($1, now())
             RETURNING id, title, created_dt",
        )
        .bind(&article.title)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn get(&self, id: i32) -> Result<Option<Article>, StorageError> {
        sqlx::query_as::<_, Article>("SELECT id, title, created_dt FROM articles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)
    }

    async fn list(&self) -> Result<Vec<Article>, StorageError> {
        sqlx::query_as::<_, Article>("SELECT id, title, created_dt FROM articles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)
    }
}

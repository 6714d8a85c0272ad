//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use crate::config::DatabaseSettings;
use crate::core::error::StorageError;
use crate::entities::{Article, NewArticle};
use async_trait::async_trait;
use std::sync::Arc;

pub use in_memory::InMemoryArticleStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresArticleStore;

/// Persistence of [`Article`]s
///
/// Implementations assign the identity and the creation timestamp.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Persist a new article
    async fn create(&self, article: NewArticle) -> Result<Article, StorageError>;

    /// Get an article by ID
    async fn get(&self, id: i32) -> Result<Option<Article>, StorageError>;

    /// List all articles, ordered by ID
    async fn list(&self) -> Result<Vec<Article>, StorageError>;
}

/// Open the store described by `settings`
///
/// Without a database URL the in-memory store is used. A URL is honored only
/// when the crate is built with the `postgres` feature.
pub async fn connect_store(
    settings: &DatabaseSettings,
) -> Result<Arc<dyn ArticleStore>, StorageError> {
    match settings.url.as_deref() {
        None => {
            tracing::info!("No database configured, using the in-memory article store");
            Ok(Arc::new(InMemoryArticleStore::new()))
        }
        #[cfg(feature = "postgres")]
        Some(url) => {
            let max_connections = settings.max_connections.unwrap_or(5);
            let store = PostgresArticleStore::connect(url, max_connections).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            tracing::warn!(
                "A database URL is configured but the postgres feature is disabled, \
                 using the in-memory article store"
            );
            Ok(Arc::new(InMemoryArticleStore::new()))
        }
    }
}

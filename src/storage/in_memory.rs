//! In-memory implementation of ArticleStore for testing and development

use super::ArticleStore;
use crate::core::error::StorageError;
use crate::entities::{Article, NewArticle};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct Inner {
    articles: BTreeMap<i32, Article>,
    last_id: i32,
}

/// In-memory article store
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
/// Identities start at 1 and are never reused.
#[derive(Clone, Default)]
pub struct InMemoryArticleStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryArticleStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn create(&self, article: NewArticle) -> Result<Article, StorageError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        let id = inner
            .last_id
            .checked_add(1)
            .ok_or(StorageError::IdentityExhausted)?;
        let article = Article {
            id,
            title: article.title,
            created_at: Utc::now(),
        };

        inner.last_id = id;
        inner.articles.insert(id, article.clone());

        Ok(article)
    }

    async fn get(&self, id: i32) -> Result<Option<Article>, StorageError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        Ok(inner.articles.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Article>, StorageError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        Ok(inner.articles.values().cloned().collect())
    }
}

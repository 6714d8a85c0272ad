//! Read-side article requests

use crate::core::error::ApiError;
use crate::entities::ArticleListOutput;
use crate::mediator::{Request, RequestHandler};
use crate::storage::ArticleStore;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Sample article query; always answers the same article
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticlesQuery;

impl Request for ArticlesQuery {
    type Response = ArticleListOutput;
}

pub struct ArticlesQueryHandler;

#[async_trait]
impl RequestHandler<ArticlesQuery> for ArticlesQueryHandler {
    async fn handle(&self, _request: &ArticlesQuery) -> Result<ArticleListOutput, ApiError> {
        Ok(ArticleListOutput {
            ident: 1,
            title: "Hello World".to_string(),
            date_created: Utc::now(),
        })
    }
}

/// Look up one stored article
#[derive(Debug, Clone, Copy)]
pub struct GetArticleQuery {
    pub id: i32,
}

impl Request for GetArticleQuery {
    type Response = ArticleListOutput;
}

pub struct GetArticleHandler {
    store: Arc<dyn ArticleStore>,
}

impl GetArticleHandler {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<GetArticleQuery> for GetArticleHandler {
    async fn handle(&self, request: &GetArticleQuery) -> Result<ArticleListOutput, ApiError> {
        self.store
            .get(request.id)
            .await?
            .map(ArticleListOutput::from)
            .ok_or_else(|| ApiError::not_found("Article", "id", request.id))
    }
}

/// Every stored article, ordered by identifier
#[derive(Debug, Clone, Copy, Default)]
pub struct ListArticlesQuery;

impl Request for ListArticlesQuery {
    type Response = Vec<ArticleListOutput>;
}

pub struct ListArticlesHandler {
    store: Arc<dyn ArticleStore>,
}

impl ListArticlesHandler {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<ListArticlesQuery> for ListArticlesHandler {
    async fn handle(&self, _request: &ListArticlesQuery) -> Result<Vec<ArticleListOutput>, ApiError> {
        let articles = self.store.list().await?;
        Ok(articles.into_iter().map(ArticleListOutput::from).collect())
    }
}

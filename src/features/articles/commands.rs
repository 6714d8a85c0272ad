//! Write-side article requests

use crate::core::error::ApiError;
use crate::entities::{ArticleListOutput, NewArticle};
use crate::mediator::{Request, RequestHandler};
use crate::storage::ArticleStore;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

/// Create a new article
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateArticleCommand {
    /// Article title, 1 to 150 characters
    #[validate(length(min = 1, max = 150))]
    #[schema(max_length = 150, example = "Release notes")]
    pub title: String,
}

impl Request for CreateArticleCommand {
    type Response = ArticleListOutput;

    fn validate_request(&self) -> Result<(), ValidationErrors> {
        self.validate()
    }
}

pub struct CreateArticleHandler {
    store: Arc<dyn ArticleStore>,
}

impl CreateArticleHandler {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<CreateArticleCommand> for CreateArticleHandler {
    async fn handle(&self, request: &CreateArticleCommand) -> Result<ArticleListOutput, ApiError> {
        let article = self
            .store
            .create(NewArticle::new(request.title.clone()))
            .await?;
        tracing::info!(id = article.id, "Article created");
        Ok(article.into())
    }
}

//! The `Article` entity and its output representation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum title length, in characters
pub const TITLE_MAX_LEN: usize = 150;

/// A persisted article
///
/// Mapped to the `articles` table; the identity is generated by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Article {
    pub id: i32,
    pub title: String,
    #[cfg_attr(feature = "postgres", sqlx(rename = "created_dt"))]
    pub created_at: DateTime<Utc>,
}

/// Values supplied when creating an article
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub title: String,
}

impl NewArticle {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Outward representation of an article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListOutput {
    /// Article identifier
    #[schema(example = 1)]
    pub ident: i32,
    /// Article title
    #[schema(example = "Hello World")]
    pub title: String,
    /// When the article was created
    pub date_created: DateTime<Utc>,
}

impl From<Article> for ArticleListOutput {
    fn from(article: Article) -> Self {
        Self {
            ident: article.id,
            title: article.title,
            date_created: article.created_at,
        }
    }
}

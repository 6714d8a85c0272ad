//! Persisted entities

pub mod article;

pub use article::{Article, ArticleListOutput, NewArticle, TITLE_MAX_LEN};

//! Article queries and commands

pub mod commands;
pub mod queries;

use crate::mediator::MediatorBuilder;
use crate::storage::ArticleStore;
use std::sync::Arc;

pub use commands::{CreateArticleCommand, CreateArticleHandler};
pub use queries::{
    ArticlesQuery, ArticlesQueryHandler, GetArticleHandler, GetArticleQuery, ListArticlesHandler,
    ListArticlesQuery,
};

/// Register the article handlers
pub fn register(builder: MediatorBuilder, store: Arc<dyn ArticleStore>) -> MediatorBuilder {
    builder
        .register_handler(ArticlesQueryHandler)
        .register_handler(GetArticleHandler::new(store.clone()))
        .register_handler(ListArticlesHandler::new(store.clone()))
        .register_handler(CreateArticleHandler::new(store))
}

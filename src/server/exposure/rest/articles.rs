//! Article endpoints
//!
//! Handlers stay thin: each one builds a request and sends it through the
//! mediator.

use crate::core::auth::AuthContext;
use crate::core::error::{ApiError, ErrorBody};
use crate::entities::ArticleListOutput;
use crate::features::articles::{
    ArticlesQuery, CreateArticleCommand, GetArticleQuery, ListArticlesQuery,
};
use crate::server::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

/// Sample article
#[utoipa::path(
    get,
    path = "/api/test/article",
    tag = "Article",
    summary = "Article List",
    description = "GET /test articles",
    security(()),
    responses(
        (status = 200, description = "The sample article", body = ArticleListOutput),
        (status = 500, description = "Unexpected failure", body = ErrorBody),
    )
)]
pub async fn test_article(
    State(state): State<AppState>,
) -> Result<Json<ArticleListOutput>, ApiError> {
    Ok(Json(state.mediator.send(ArticlesQuery).await?))
}

/// All stored articles
#[utoipa::path(
    get,
    path = "/api/articles",
    tag = "Article",
    security(()),
    responses(
        (status = 200, description = "Stored articles ordered by id", body = [ArticleListOutput]),
        (status = 500, description = "Unexpected failure", body = ErrorBody),
    )
)]
pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticleListOutput>>, ApiError> {
    Ok(Json(state.mediator.send(ListArticlesQuery).await?))
}

/// One stored article
#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    tag = "Article",
    security(()),
    params(("id" = i32, Path, description = "Article identifier")),
    responses(
        (status = 200, description = "Article found", body = ArticleListOutput),
        (status = 404, description = "No article with this id", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ErrorBody),
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ArticleListOutput>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::with_status(e.status(), e.body_text()))?;
    Ok(Json(state.mediator.send(GetArticleQuery { id }).await?))
}

/// Create an article (administrators only)
#[utoipa::path(
    post,
    path = "/api/articles",
    tag = "Article",
    request_body = CreateArticleCommand,
    responses(
        (status = 201, description = "Article created", body = ArticleListOutput),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 403, description = "Caller lacks AccessLevel ADMIN", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ErrorBody),
    )
)]
pub async fn create_article(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    body: Result<Json<CreateArticleCommand>, JsonRejection>,
) -> Result<(StatusCode, Json<ArticleListOutput>), ApiError> {
    let Json(command) = body.map_err(|e| ApiError::with_status(e.status(), e.body_text()))?;

    let created = state.mediator.send(command).await?;
    tracing::info!(
        id = created.ident,
        by = caller.subject().unwrap_or("anonymous"),
        "Article created via API"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

//! OpenAPI document
//!
//! Assembles the utoipa-documented article routes into one OpenAPI 3 document.
//! In the `Local` environment it is served at `/swagger/v1/swagger.json`,
//! elsewhere at `/api/swagger/v1/swagger.json` (behind the API prefix of the
//! reverse proxy).

use crate::config::Environment;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the bearer security scheme
pub const SECURITY_SCHEME: &str = "Bearer";

/// Adds the JWT bearer security scheme to the document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            SECURITY_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("JSON Web Token based security"))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Article Api",
        version = "v1",
        description = "Article endpoints. Authentication: `Authorization: Bearer <jwt>`; \
                       writes require the `AccessLevel` claim to be `ADMIN`."
    ),
    security(
        ("Bearer" = [])
    ),
    paths(
        crate::server::exposure::rest::articles::test_article,
        crate::server::exposure::rest::articles::list_articles,
        crate::server::exposure::rest::articles::get_article,
        crate::server::exposure::rest::articles::create_article,
    ),
    components(
        schemas(
            crate::entities::ArticleListOutput,
            crate::features::articles::CreateArticleCommand,
            crate::core::error::ErrorBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Article", description = "Article queries and commands")
    )
)]
pub struct ApiDoc;

/// The document, titled for `environment`
pub fn document(environment: &Environment) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = format!("Article Api - {} - v1", environment.title_case());
    doc
}

/// Where the document is served in `environment`
pub fn document_path(environment: &Environment) -> &'static str {
    if environment.is_local() {
        "/swagger/v1/swagger.json"
    } else {
        "/api/swagger/v1/swagger.json"
    }
}

/// Router serving the document
pub fn router(environment: &Environment) -> Router {
    let doc = Arc::new(document(environment));
    Router::new().route(
        document_path(environment),
        get(move || {
            let doc = doc.clone();
            async move { Json(doc.as_ref().clone()) }
        }),
    )
}

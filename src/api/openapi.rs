//! OpenAPI documentation

use axum::Router;
use utoipa::{openapi::server::Server, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookstore API",
        version = "1.0.0",
        description = "Book and author catalog REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::author::Author,
            books::BookResponse,
            books::BookListResponse,
            books::MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book and author management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router; paths are served under `api_prefix`
pub fn create_openapi_router(api_prefix: &str) -> Router {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![Server::new(api_prefix)]);

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc))
}

//! Book endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, ErrorResponse, StatusError},
    models::Book,
    AppState,
};

/// Single book payload
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub message: String,
    pub data: Book,
}

/// Book list payload
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub message: String,
    /// Empty when the catalog has no books
    pub data: Vec<Book>,
}

/// Payload for operations that return no data
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Update and delete report every service failure other than bad input
/// as a server error, a missing book included.
fn mutation_error(err: AppError) -> StatusError {
    let status = match &err {
        AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    StatusError(status, err)
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "Books with their authors", body = BookListResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<BookListResponse>> {
    let books = state.services.books.list_books().await?;
    let message = if books.is_empty() {
        "No books found"
    } else {
        "Books retrieved successfully"
    };
    Ok(Json(BookListResponse {
        message: message.to_string(),
        data: books,
    }))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 400, description = "Empty ID", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.books.get_book(&id).await?;
    Ok(Json(BookResponse {
        message: "Book retrieved successfully".to_string(),
        data: book,
    }))
}

/// Create a book and, when needed, its author
#[utoipa::path(
    post,
    path = "/books/create",
    tag = "books",
    request_body = Book,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    WithRejection(Json(book), _): WithRejection<Json<Option<Book>>, AppError>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let book = state.services.books.create_book(book).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            message: "Book created successfully".to_string(),
            data: book,
        }),
    ))
}

/// Update a book; only non-empty fields are written
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    request_body = Book,
    responses(
        (status = 200, description = "Updated book", body = BookResponse),
        (status = 400, description = "Invalid ID or body", body = ErrorResponse),
        (status = 500, description = "Storage error or book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(book), _): WithRejection<Json<Option<Book>>, AppError>,
) -> Result<Json<BookResponse>, StatusError> {
    state
        .services
        .books
        .update_book(&id, book)
        .await
        .map_err(mutation_error)?;

    let book = state.services.books.get_book(&id).await.map_err(|e| {
        tracing::error!("Book {} updated but could not be read back: {}", id, e);
        StatusError(StatusCode::INTERNAL_SERVER_ERROR, e)
    })?;

    Ok(Json(BookResponse {
        message: "Book updated successfully".to_string(),
        data: book,
    }))
}

/// Soft-delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 400, description = "Empty ID", body = ErrorResponse),
        (status = 500, description = "Storage error or book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, StatusError> {
    state
        .services
        .books
        .delete_book(&id)
        .await
        .map_err(mutation_error)?;

    Ok(Json(MessageResponse {
        message: "Book deleted successfully".to_string(),
    }))
}

//! Book service: input checks and existence preconditions

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::Book,
    repository::BookRepository,
};

fn require_id(id: &str) -> AppResult<()> {
    if id.is_empty() {
        return Err(AppError::Validation("book ID cannot be empty".to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    /// List live books. An empty catalog is an empty list.
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.get_all_books().await
    }

    /// Get a book with its author
    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        require_id(id)?;
        self.repository.get_book_by_id(id).await
    }

    /// Create a book, creating its author when needed
    pub async fn create_book(&self, book: Option<Book>) -> AppResult<Book> {
        let book = book.ok_or_else(|| AppError::Validation("book cannot be empty".to_string()))?;

        if book.name.is_empty() {
            return Err(AppError::Validation("book name cannot be empty".to_string()));
        }
        if book.author.name.is_empty() {
            return Err(AppError::Validation("author name cannot be empty".to_string()));
        }

        self.repository.create_book(book).await
    }

    /// Update an existing book
    pub async fn update_book(&self, id: &str, book: Option<Book>) -> AppResult<()> {
        require_id(id)?;
        let book = book.ok_or_else(|| AppError::Validation("book cannot be empty".to_string()))?;

        // Check if book exists
        self.repository.get_book_by_id(id).await?;
        self.repository.update_book(id, book).await
    }

    /// Soft-delete an existing book
    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        require_id(id)?;

        // Check if book exists
        self.repository.get_book_by_id(id).await?;
        self.repository.delete_book(id).await
    }

    /// Storage readiness
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

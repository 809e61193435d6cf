//! Repository layer: book/author persistence workflows

pub mod books;

use async_trait::async_trait;

use crate::{error::AppResult, models::Book};

pub use books::BooksRepository;

/// Book persistence operations used by the service layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Books that are not soft-deleted, each with its author.
    async fn get_all_books(&self) -> AppResult<Vec<Book>>;

    /// Fails with `NotFound` when no live book has this id.
    async fn get_book_by_id(&self, id: &str) -> AppResult<Book>;

    /// Create the book, creating or reusing its author, in one transaction.
    async fn create_book(&self, book: Book) -> AppResult<Book>;

    /// Merge the non-zero fields of `book` into the stored book `id`, in one
    /// transaction.
    async fn update_book(&self, id: &str, book: Book) -> AppResult<()>;

    /// Soft-delete. Fails with `NotFound` when nothing matched.
    async fn delete_book(&self, id: &str) -> AppResult<()>;

    /// Check that storage answers.
    async fn ping(&self) -> AppResult<()>;
}

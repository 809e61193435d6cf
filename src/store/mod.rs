//! Entity store: primitive persistence steps for books and authors.
//!
//! The repository composes these steps into transactional workflows. Every
//! write goes through a [`StoreTx`]; dropping a transaction without calling
//! [`StoreTx::commit`] discards its writes.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Author, Book, BookChanges},
};

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

/// Storage backend for books and authors.
#[async_trait]
pub trait BookStore: Send + Sync + 'static {
    type Tx: StoreTx;

    /// Open a transaction. Failures map to `AppError::Transaction`.
    async fn begin(&self) -> AppResult<Self::Tx>;

    /// All books that are not soft-deleted, with their authors.
    async fn list_books(&self) -> AppResult<Vec<Book>>;

    /// A book that is not soft-deleted, with its author.
    async fn find_book(&self, id: &str) -> AppResult<Option<Book>>;

    /// Mark a book as deleted. Returns the number of rows affected.
    async fn soft_delete_book(&self, id: &str) -> AppResult<u64>;

    /// Check that the backend answers.
    async fn ping(&self) -> AppResult<()>;
}

/// One open transaction against a [`BookStore`].
#[async_trait]
pub trait StoreTx: Send + Sized {
    async fn find_author(&mut self, id: &str) -> AppResult<Option<Author>>;

    /// Insert an author. A row with the same id that already exists is left
    /// untouched.
    async fn insert_author(&mut self, author: &Author) -> AppResult<()>;

    /// Overwrite `name` and `bio` of an existing author.
    async fn update_author(&mut self, author: &Author) -> AppResult<()>;

    /// A book that is not soft-deleted, with its author. The row stays
    /// locked until the transaction ends.
    async fn find_book(&mut self, id: &str) -> AppResult<Option<Book>>;

    async fn insert_book(&mut self, book: &Book) -> AppResult<()>;

    /// Write only the columns present in `changes`.
    async fn update_book(&mut self, id: &str, changes: &BookChanges) -> AppResult<()>;

    async fn commit(self) -> AppResult<()>;

    async fn rollback(self) -> AppResult<()>;
}

//! Books repository: transactional author linkage on top of a [`BookStore`]

use async_trait::async_trait;
use uuid::Uuid;

use super::BookRepository;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookChanges},
    store::{BookStore, StoreTx},
};

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("book with ID {} not found", id))
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Roll back after a failed step, keeping the original error.
async fn abort<T: StoreTx>(tx: T, cause: &AppError) {
    tracing::debug!("Rolling back transaction: {}", cause);
    if let Err(e) = tx.rollback().await {
        tracing::warn!("Rollback failed after '{}': {}", cause, e);
    }
}

#[derive(Clone)]
pub struct BooksRepository<S> {
    store: S,
}

impl<S: BookStore> BooksRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    async fn create_in(tx: &mut S::Tx, mut book: Book) -> AppResult<Book> {
        if !book.has_id() {
            book.id = new_id();
        }

        if !book.author.has_id() {
            book.author.id = new_id();
            tx.insert_author(&book.author).await?;
        } else {
            match tx.find_author(&book.author.id).await? {
                // Caller-supplied id for an author that does not exist yet
                None => tx.insert_author(&book.author).await?,
                // Existing authors are linked, never modified
                Some(existing) => {
                    tracing::debug!(author_id = %existing.id, "Reusing existing author");
                }
            }
        }

        book.author_id = book.author.id.clone();
        tx.insert_book(&book).await?;

        tx.find_book(&book.id).await?.ok_or_else(|| {
            AppError::Internal(format!("book {} missing right after insert", book.id))
        })
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    async fn update_in(tx: &mut S::Tx, id: &str, mut book: Book) -> AppResult<()> {
        tx.find_book(id).await?.ok_or_else(|| not_found(id))?;

        if book.author.has_id() {
            match tx.find_author(&book.author.id).await? {
                None => tx.insert_author(&book.author).await?,
                Some(mut existing) => {
                    existing.name = book.author.name.clone();
                    existing.bio = book.author.bio.clone();
                    tx.update_author(&existing).await?;
                }
            }
            book.author_id = book.author.id.clone();
        }

        book.id = id.to_string();
        let changes = BookChanges::from_non_zero(&book);
        tx.update_book(id, &changes).await
    }
}

#[async_trait]
impl<S: BookStore> BookRepository for BooksRepository<S> {
    async fn get_all_books(&self) -> AppResult<Vec<Book>> {
        self.store.list_books().await
    }

    async fn get_book_by_id(&self, id: &str) -> AppResult<Book> {
        self.store.find_book(id).await?.ok_or_else(|| not_found(id))
    }

    #[tracing::instrument(skip_all, fields(book_id = %book.id, author_id = %book.author.id))]
    async fn create_book(&self, book: Book) -> AppResult<Book> {
        let mut tx = self.store.begin().await?;

        match Self::create_in(&mut tx, book).await {
            Ok(created) => {
                tx.commit().await?;
                tracing::info!(
                    book_id = %created.id,
                    author_id = %created.author_id,
                    "Book created"
                );
                Ok(created)
            }
            Err(e) => {
                abort(tx, &e).await;
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self, book))]
    async fn update_book(&self, id: &str, book: Book) -> AppResult<()> {
        let mut tx = self.store.begin().await?;

        match Self::update_in(&mut tx, id, book).await {
            Ok(()) => {
                tx.commit().await?;
                tracing::info!(book_id = %id, "Book updated");
                Ok(())
            }
            Err(e) => {
                abort(tx, &e).await;
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_book(&self, id: &str) -> AppResult<()> {
        if self.store.soft_delete_book(id).await? == 0 {
            return Err(not_found(id));
        }
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}

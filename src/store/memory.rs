//! In-memory entity store.
//!
//! Transactions are serialized: `begin` takes the table lock and holds it
//! until the transaction is committed, rolled back or dropped. Writes go to
//! a working copy that only replaces the shared tables on commit.
//!
//! Failure points can be armed to make a given step fail, which is how
//! rollback behavior is exercised in tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{BookStore, StoreTx};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookChanges},
};

/// Storage step that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    Read,
    InsertAuthor,
    UpdateAuthor,
    InsertBook,
    UpdateBook,
    SoftDelete,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    authors: HashMap<String, Author>,
    /// Insertion order, soft-deleted rows included
    books: Vec<Book>,
}

impl Tables {
    fn live_book(&self, id: &str) -> Option<&Book> {
        self.books
            .iter()
            .find(|b| b.id == id && b.deleted_at.is_none())
    }

    /// Attach the author, dropping books whose author is missing like an
    /// inner join would.
    fn joined(&self, book: &Book) -> Option<Book> {
        let author = self.authors.get(&book.author_id)?;
        let mut book = book.clone();
        book.author = author.clone();
        Some(book)
    }
}

/// Column widths of the SQL schema
const ID_MAX_CHARS: usize = 191;
const DESCRIPTION_MAX_CHARS: usize = 255;

fn check_width(context: &str, column: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::constraint(
            context,
            format!("value too long for {} (max {} characters)", column, max),
        ));
    }
    Ok(())
}

fn injected(point: FailPoint) -> AppError {
    let message = format!("injected failure at {:?}", point);
    match point {
        FailPoint::Begin | FailPoint::Commit => AppError::Transaction(message),
        FailPoint::InsertAuthor
        | FailPoint::UpdateAuthor
        | FailPoint::InsertBook
        | FailPoint::UpdateBook => AppError::Constraint(message),
        FailPoint::Read | FailPoint::SoftDelete => AppError::Database(sqlx::Error::PoolTimedOut),
    }
}

/// Store keeping both tables in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_points: Arc<Mutex<HashSet<FailPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `point` step fail until cleared.
    pub async fn fail_on(&self, point: FailPoint) {
        self.fail_points.lock().await.insert(point);
    }

    pub async fn clear_failures(&self) {
        self.fail_points.lock().await.clear();
    }

    /// Stored author row, regardless of any book referencing it.
    pub async fn author(&self, id: &str) -> Option<Author> {
        self.tables.lock().await.authors.get(id).cloned()
    }

    pub async fn author_count(&self) -> usize {
        self.tables.lock().await.authors.len()
    }

    /// Number of book rows, soft-deleted ones included.
    pub async fn book_count(&self) -> usize {
        self.tables.lock().await.books.len()
    }

    /// Stored book row, soft-deleted or not, without its author.
    pub async fn raw_book(&self, id: &str) -> Option<Book> {
        self.tables
            .lock()
            .await
            .books
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    async fn check(&self, point: FailPoint) -> AppResult<()> {
        if self.fail_points.lock().await.contains(&point) {
            return Err(injected(point));
        }
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> AppResult<MemoryTx> {
        self.check(FailPoint::Begin).await?;
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        let fail_points = self.fail_points.lock().await.clone();
        Ok(MemoryTx {
            guard,
            working,
            fail_points,
        })
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.check(FailPoint::Read).await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .books
            .iter()
            .filter(|b| b.deleted_at.is_none())
            .filter_map(|b| tables.joined(b))
            .collect())
    }

    async fn find_book(&self, id: &str) -> AppResult<Option<Book>> {
        self.check(FailPoint::Read).await?;
        let tables = self.tables.lock().await;
        Ok(tables.live_book(id).and_then(|b| tables.joined(b)))
    }

    async fn soft_delete_book(&self, id: &str) -> AppResult<u64> {
        self.check(FailPoint::SoftDelete).await?;
        let mut tables = self.tables.lock().await;
        match tables
            .books
            .iter_mut()
            .find(|b| b.id == id && b.deleted_at.is_none())
        {
            Some(book) => {
                book.deleted_at = Some(Utc::now());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        self.check(FailPoint::Read).await
    }
}

/// Open in-memory transaction holding the table lock
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fail_points: HashSet<FailPoint>,
}

impl MemoryTx {
    fn check(&self, point: FailPoint) -> AppResult<()> {
        if self.fail_points.contains(&point) {
            return Err(injected(point));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_author(&mut self, id: &str) -> AppResult<Option<Author>> {
        self.check(FailPoint::Read)?;
        Ok(self.working.authors.get(id).cloned())
    }

    async fn insert_author(&mut self, author: &Author) -> AppResult<()> {
        self.check(FailPoint::InsertAuthor)?;
        if self.working.authors.contains_key(&author.id) {
            return Ok(());
        }
        check_width("failed to create author", "authors.id", &author.id, ID_MAX_CHARS)?;
        let now = Utc::now();
        let row = Author {
            books: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
            ..author.clone()
        };
        self.working.authors.insert(row.id.clone(), row);
        Ok(())
    }

    async fn update_author(&mut self, author: &Author) -> AppResult<()> {
        self.check(FailPoint::UpdateAuthor)?;
        if let Some(row) = self.working.authors.get_mut(&author.id) {
            row.name = author.name.clone();
            row.bio = author.bio.clone();
            row.updated_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn find_book(&mut self, id: &str) -> AppResult<Option<Book>> {
        self.check(FailPoint::Read)?;
        Ok(self
            .working
            .live_book(id)
            .and_then(|b| self.working.joined(b)))
    }

    async fn insert_book(&mut self, book: &Book) -> AppResult<()> {
        self.check(FailPoint::InsertBook)?;
        check_width("failed to create book", "books.id", &book.id, ID_MAX_CHARS)?;
        check_width(
            "failed to create book",
            "books.description",
            &book.description,
            DESCRIPTION_MAX_CHARS,
        )?;
        if self.working.books.iter().any(|b| b.id == book.id) {
            return Err(AppError::constraint(
                "failed to create book",
                format!("duplicate book id {}", book.id),
            ));
        }
        if !self.working.authors.contains_key(&book.author_id) {
            return Err(AppError::constraint(
                "failed to create book",
                format!("author {} does not exist", book.author_id),
            ));
        }
        let now = Utc::now();
        let row = Book {
            author: Author::default(),
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
            ..book.clone()
        };
        self.working.books.push(row);
        Ok(())
    }

    async fn update_book(&mut self, id: &str, changes: &BookChanges) -> AppResult<()> {
        self.check(FailPoint::UpdateBook)?;
        if let Some(ref description) = changes.description {
            check_width(
                "failed to update book",
                "books.description",
                description,
                DESCRIPTION_MAX_CHARS,
            )?;
        }
        if let Some(ref author_id) = changes.author_id {
            if !self.working.authors.contains_key(author_id) {
                return Err(AppError::constraint(
                    "failed to update book",
                    format!("author {} does not exist", author_id),
                ));
            }
        }
        let book = self
            .working
            .books
            .iter_mut()
            .find(|b| b.id == id && b.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("book with ID {} not found", id)))?;
        changes.apply_to(book);
        book.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn commit(mut self) -> AppResult<()> {
        self.check(FailPoint::Commit)?;
        *self.guard = self.working;
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        Ok(())
    }
}

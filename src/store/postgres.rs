//! PostgreSQL entity store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, Pool, Postgres, Transaction};

use super::{BookStore, StoreTx};
use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    models::{Author, Book, BookChanges},
};

/// Joined book + author projection. Only rows whose book is not
/// soft-deleted are selected.
const BOOK_SELECT: &str = r#"
    SELECT b.id, b.name, b.author_id, b.publisher, b.published_year, b.description,
           b.price, b.pages, b.created_at, b.updated_at, b.deleted_at,
           a.name AS author_name, a.bio AS author_bio,
           a.created_at AS author_created_at, a.updated_at AS author_updated_at,
           a.deleted_at AS author_deleted_at
    FROM books b
    JOIN authors a ON a.id = b.author_id
    WHERE b.deleted_at IS NULL
"#;

#[derive(FromRow)]
struct BookRow {
    id: String,
    name: String,
    author_id: String,
    publisher: String,
    published_year: i32,
    description: String,
    price: f64,
    pages: i32,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    author_name: String,
    author_bio: String,
    author_created_at: Option<DateTime<Utc>>,
    author_updated_at: Option<DateTime<Utc>>,
    author_deleted_at: Option<DateTime<Utc>>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            author: Author {
                id: row.author_id.clone(),
                name: row.author_name,
                bio: row.author_bio,
                books: Vec::new(),
                created_at: row.author_created_at,
                updated_at: row.author_updated_at,
                deleted_at: row.author_deleted_at,
            },
            id: row.id,
            name: row.name,
            author_id: row.author_id,
            publisher: row.publisher,
            published_year: row.published_year,
            description: row.description,
            price: row.price,
            pages: row.pages,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Store backed by a shared PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Open the connection pool described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.connection_url())
            .await?;
        Ok(Self::new(pool))
    }

    /// Create missing tables and indexes. Migrations only ever add.
    pub async fn sync_schema(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("schema synchronization failed: {}", e)))
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl BookStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> AppResult<PgTx> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::transaction("failed to begin transaction", e))?;
        Ok(PgTx { tx })
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let query = format!("{} ORDER BY b.created_at, b.id", BOOK_SELECT);
        let rows = sqlx::query_as::<_, BookRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_book(&self, id: &str) -> AppResult<Option<Book>> {
        let query = format!("{} AND b.id = $1", BOOK_SELECT);
        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Book::from))
    }

    async fn soft_delete_book(&self, id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE books SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Open PostgreSQL transaction. Dropped without commit, it rolls back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_author(&mut self, id: &str) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, name, bio, created_at, updated_at, deleted_at FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(author)
    }

    async fn insert_author(&mut self, author: &Author) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO authors (id, name, bio, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&author.id)
        .bind(&author.name)
        .bind(&author.bio)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::constraint("failed to create author", e))?;
        Ok(())
    }

    async fn update_author(&mut self, author: &Author) -> AppResult<()> {
        sqlx::query("UPDATE authors SET name = $1, bio = $2, updated_at = $3 WHERE id = $4")
            .bind(&author.name)
            .bind(&author.bio)
            .bind(Utc::now())
            .bind(&author.id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| AppError::constraint("failed to update author", e))?;
        Ok(())
    }

    async fn find_book(&mut self, id: &str) -> AppResult<Option<Book>> {
        let query = format!("{} AND b.id = $1 FOR UPDATE OF b", BOOK_SELECT);
        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Book::from))
    }

    async fn insert_book(&mut self, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                id, name, author_id, publisher, published_year, description,
                price, pages, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            "#,
        )
        .bind(&book.id)
        .bind(&book.name)
        .bind(&book.author_id)
        .bind(&book.publisher)
        .bind(book.published_year)
        .bind(&book.description)
        .bind(book.price)
        .bind(book.pages)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::constraint("failed to create book", e))?;
        Ok(())
    }

    async fn update_book(&mut self, id: &str, changes: &BookChanges) -> AppResult<()> {
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(changes.name, "name");
        add_field!(changes.author_id, "author_id");
        add_field!(changes.publisher, "publisher");
        add_field!(changes.published_year, "published_year");
        add_field!(changes.description, "description");
        add_field!(changes.price, "price");
        add_field!(changes.pages, "pages");

        let query = format!(
            "UPDATE books SET {} WHERE id = ${} AND deleted_at IS NULL",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query(&query).bind(Utc::now());

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(changes.name);
        bind_field!(changes.author_id);
        bind_field!(changes.publisher);
        bind_field!(changes.published_year);
        bind_field!(changes.description);
        bind_field!(changes.price);
        bind_field!(changes.pages);

        let result = builder
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| AppError::constraint("failed to update book", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("book with ID {} not found", id)));
        }
        Ok(())
    }

    async fn commit(self) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::transaction("failed to commit transaction", e))
    }

    async fn rollback(self) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AppError::transaction("failed to roll back transaction", e))
    }
}

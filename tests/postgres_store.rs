//! Repository workflows against a real PostgreSQL database
//!
//! Requires DATABASE_URL; run with: cargo test --test postgres_store -- --ignored

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use bookstore_server::{
    models::{Author, Book},
    repository::{BookRepository, BooksRepository},
    store::PgStore,
    AppError,
};

async fn repo() -> BooksRepository<PgStore> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    let store = PgStore::new(pool);
    store.sync_schema().await.expect("Failed to sync schema");
    BooksRepository::new(store)
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

fn sample(name: &str) -> Book {
    Book {
        name: name.to_string(),
        author: Author {
            name: "J.Doe".to_string(),
            bio: "...".to_string(),
            ..Default::default()
        },
        publisher: "P".to_string(),
        published_year: 2020,
        description: "d".to_string(),
        price: 29.99,
        pages: 100,
        ..Default::default()
    }
}

async fn author_exists(repo: &BooksRepository<PgStore>, id: &str) -> bool {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM authors WHERE id = $1)")
        .bind(id)
        .fetch_one(repo.store().pool())
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn test_failed_book_insert_rolls_back_author() {
    let repo = repo().await;
    let first = repo.create_book(sample("First")).await.unwrap();

    // Same book id again: the author insert succeeds, the book insert hits
    // the primary key.
    let new_author = unique("author");
    let mut clash = sample("Clash");
    clash.id = first.id.clone();
    clash.author.id = new_author.clone();

    let err = repo.create_book(clash).await.unwrap_err();
    assert!(matches!(err, AppError::Constraint(_)));
    assert!(!author_exists(&repo, &new_author).await);
}

#[tokio::test]
#[ignore]
async fn test_existing_author_is_reused_unchanged() {
    let repo = repo().await;
    let first = repo.create_book(sample("First")).await.unwrap();

    let mut second = sample("Second");
    second.author = Author {
        id: first.author_id.clone(),
        name: "Someone Else".to_string(),
        bio: "rewritten".to_string(),
        ..Default::default()
    };
    let created = repo.create_book(second).await.unwrap();

    assert_eq!(created.author_id, first.author_id);
    assert_eq!(created.author.name, "J.Doe");
    assert_eq!(created.author.bio, "...");
}

#[tokio::test]
#[ignore]
async fn test_partial_update_and_soft_delete() {
    let repo = repo().await;
    let created = repo.create_book(sample("Before")).await.unwrap();

    let patch = Book {
        id: unique("ignored"),
        name: "New Title".to_string(),
        ..Default::default()
    };
    repo.update_book(&created.id, patch).await.unwrap();

    let updated = repo.get_book_by_id(&created.id).await.unwrap();
    assert_eq!(updated.name, "New Title");
    assert_eq!(updated.price, 29.99);

    repo.delete_book(&created.id).await.unwrap();
    assert!(repo.get_book_by_id(&created.id).await.unwrap_err().is_not_found());
    assert!(repo
        .get_all_books()
        .await
        .unwrap()
        .iter()
        .all(|b| b.id != created.id));
    assert!(repo.delete_book(&created.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore]
async fn test_concurrent_creates_share_new_author() {
    let repo = repo().await;
    let author_id = unique("author");

    let mut first = sample("First");
    first.author.id = author_id.clone();
    first.author.name = "First Writer".to_string();
    let mut second = sample("Second");
    second.author.id = author_id.clone();
    second.author.name = "Second Writer".to_string();

    let (a, b) = tokio::join!(repo.create_book(first), repo.create_book(second));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.author_id, author_id);
    assert_eq!(b.author_id, author_id);

    let rows = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM authors WHERE id = $1")
        .bind(&author_id)
        .fetch_one(repo.store().pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);

    // Whoever committed first owns the row; the other create reads it back
    let stored: String = sqlx::query_scalar("SELECT name FROM authors WHERE id = $1")
        .bind(&author_id)
        .fetch_one(repo.store().pool())
        .await
        .unwrap();
    assert!(stored == "First Writer" || stored == "Second Writer");
    assert_eq!(a.author.name, stored);
    assert_eq!(b.author.name, stored);
}

#[tokio::test]
#[ignore]
async fn test_dropped_transaction_rolls_back() {
    use bookstore_server::store::{BookStore, StoreTx};

    let repo = repo().await;
    let author_id = unique("author");

    let mut tx = repo.store().begin().await.unwrap();
    tx.insert_author(&Author {
        id: author_id.clone(),
        name: "Never Committed".to_string(),
        ..Default::default()
    })
    .await
    .unwrap();
    drop(tx);

    assert!(!author_exists(&repo, &author_id).await);
}

//! Tests against a running server
//!
//! Start the server, then run with: cargo test --test live_api -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
#[ignore]
async fn test_create_get_delete_book() {
    let client = Client::new();

    // Create book
    let response = client
        .post(format!("{}/books/create", BASE_URL))
        .json(&json!({
            "name": "Live Test Book",
            "author": { "name": "Live Author", "bio": "Created by the live API test" },
            "publisher": "Test Press",
            "published_year": 2024,
            "description": "Temporary",
            "price": 1.5,
            "pages": 10
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let book_id = body["data"]["id"].as_str().expect("No book ID").to_string();

    // Read it back
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["author"]["name"], "Live Author");

    // Delete book
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_create_invalid_body() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books/create", BASE_URL))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

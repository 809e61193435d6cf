//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::author::Author;

/// Book record, always read together with its author.
///
/// Every field defaults when missing from a request body so that the same
/// type serves create payloads and partial update payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Book {
    /// Identifier, generated on creation when left empty
    pub id: String,
    /// Display title
    pub name: String,
    /// Reference to the owning author record
    pub author_id: String,
    pub author: Author,
    pub publisher: String,
    pub published_year: i32,
    /// Short description (at most 255 characters are stored)
    pub description: String,
    pub price: f64,
    pub pages: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Set when the book has been soft-deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Column values to write during a partial book update.
///
/// Only the non-zero fields of an incoming book end up here; everything
/// left as `None` keeps its stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub name: Option<String>,
    pub author_id: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<i32>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub pages: Option<i32>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl BookChanges {
    /// Collect the non-zero fields of `book`.
    pub fn from_non_zero(book: &Book) -> Self {
        Self {
            name: non_empty(&book.name),
            author_id: non_empty(&book.author_id),
            publisher: non_empty(&book.publisher),
            published_year: (book.published_year != 0).then_some(book.published_year),
            description: non_empty(&book.description),
            price: (book.price != 0.0).then_some(book.price),
            pages: (book.pages != 0).then_some(book.pages),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the changes onto a stored book.
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(ref name) = self.name {
            book.name = name.clone();
        }
        if let Some(ref author_id) = self.author_id {
            book.author_id = author_id.clone();
        }
        if let Some(ref publisher) = self.publisher {
            book.publisher = publisher.clone();
        }
        if let Some(year) = self.published_year {
            book.published_year = year;
        }
        if let Some(ref description) = self.description {
            book.description = description.clone();
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(pages) = self.pages {
            book.pages = pages;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_skip_zero_fields() {
        let incoming = Book {
            name: "New Title".to_string(),
            ..Default::default()
        };
        let changes = BookChanges::from_non_zero(&incoming);
        assert_eq!(changes.name.as_deref(), Some("New Title"));
        assert_eq!(changes.price, None);
        assert_eq!(changes.pages, None);
        assert_eq!(changes.author_id, None);
    }

    #[test]
    fn test_apply_preserves_omitted_fields() {
        let mut stored = Book {
            id: "b1".to_string(),
            name: "Old Title".to_string(),
            price: 29.99,
            pages: 300,
            ..Default::default()
        };
        let changes = BookChanges::from_non_zero(&Book {
            name: "New Title".to_string(),
            ..Default::default()
        });
        changes.apply_to(&mut stored);
        assert_eq!(stored.name, "New Title");
        assert_eq!(stored.price, 29.99);
        assert_eq!(stored.pages, 300);
        assert_eq!(stored.id, "b1");
    }

    #[test]
    fn test_partial_body_deserializes() {
        let book: Book = serde_json::from_str(r#"{"name": "Only a name"}"#).unwrap();
        assert_eq!(book.name, "Only a name");
        assert!(!book.has_id());
        assert!(!book.author.has_id());
        assert!(BookChanges::default().is_empty());
    }
}

//! Author model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::Book;

/// Author record.
///
/// Authors do not own books: a book points at its author through
/// `author_id`, and `books` is only the reverse view of that link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(default)]
pub struct Author {
    /// Identifier, generated on creation when left empty
    pub id: String,
    pub name: String,
    pub bio: String,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub books: Vec<Book>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Author {
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

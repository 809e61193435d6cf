//! Data models for the bookstore

pub mod author;
pub mod book;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookChanges};

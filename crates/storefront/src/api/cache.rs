//! Cache types for catalog responses.

use bookstore_core::Book;

use super::catalog::BookPage;

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Book(Box<Book>),
    Books(BookPage),
}

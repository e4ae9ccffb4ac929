//! Catalog browsing against the books service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::form_urlencoded;

use bookstore_core::{Book, BookId};

use super::cache::CacheValue;
use super::conversions::{convert_book, decode_book, decode_book_page};
use super::{ApiError, BackendClient, paths};

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_SIZE: u32 = 12;
/// Largest page size the storefront will ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Field a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Title,
    Price,
    Author,
}

impl SortField {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Price => "price",
            Self::Author => "author",
        }
    }
}

/// Sort order, written `title` for ascending or `-price` for descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookSort {
    pub field: SortField,
    pub descending: bool,
}

impl BookSort {
    /// The `field,direction` form the books service expects.
    #[must_use]
    pub fn backend_param(self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("{},{direction}", self.field.as_str())
    }
}

impl FromStr for BookSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (descending, name) = s
            .strip_prefix('-')
            .map_or((false, s), |rest| (true, rest));

        let field = match name.to_ascii_lowercase().as_str() {
            "title" => SortField::Title,
            "price" => SortField::Price,
            "author" => SortField::Author,
            other => return Err(format!("unknown sort field '{other}'")),
        };
        Ok(Self { field, descending })
    }
}

impl TryFrom<String> for BookSort {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BookSort> for String {
    fn from(sort: BookSort) -> Self {
        sort.to_string()
    }
}

impl fmt::Display for BookSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(self.field.as_str())
    }
}

/// What the catalog page is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookQuery {
    pub page: u32,
    pub size: u32,
    pub search: Option<String>,
    pub sort: Option<BookSort>,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            search: None,
            sort: None,
        }
    }
}

impl BookQuery {
    /// Clamp the page size into `1..=MAX_PAGE_SIZE` and drop a blank search.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.size = self.size.clamp(1, MAX_PAGE_SIZE);
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// Backend path with query string, e.g. `books?page=0&size=12`.
    #[must_use]
    pub fn backend_path(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("page", &self.page.to_string());
        query.append_pair("size", &self.size.to_string());
        if let Some(search) = &self.search {
            query.append_pair("search", search);
        }
        if let Some(sort) = self.sort {
            query.append_pair("sort", &sort.backend_param());
        }
        format!("{}?{}", paths::BOOKS, query.finish())
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub books: Vec<Book>,
    pub page: u32,
    pub size: u32,
    /// Total matches, when the backend reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

// =============================================================================
// Catalog Methods
// =============================================================================

impl BackendClient {
    /// List books. Results for queries without a search term are cached.
    ///
    /// Catalog endpoints are public, so no token store is involved and
    /// cached pages are shared between browsers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails or the body is not a
    /// book listing.
    #[instrument(skip(self))]
    pub async fn list_books(&self, query: &BookQuery) -> Result<BookPage, ApiError> {
        let path = query.backend_path();
        let cache_key = format!("books:{path}");

        if query.search.is_none()
            && let Some(CacheValue::Books(page)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for book listing");
            return Ok(page);
        }

        let body: serde_json::Value = self.get_json(None, &path).await?;
        let listing = decode_book_page(&body)?;
        let page = BookPage {
            books: listing.content.into_iter().map(convert_book).collect(),
            page: listing.number.unwrap_or(query.page),
            size: listing.size.unwrap_or(query.size),
            total: listing.total_elements,
        };

        if query.search.is_none() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Books(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a single book.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 if the book does not exist, or
    /// any other error from the request.
    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn get_book(&self, id: BookId) -> Result<Book, ApiError> {
        let cache_key = format!("book:{id}");

        if let Some(CacheValue::Book(book)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for book");
            return Ok(*book);
        }

        let body: serde_json::Value = self
            .get_json(None, &format!("{}/{id}", paths::BOOKS))
            .await?;
        let book = convert_book(decode_book(&body)?);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Book(Box::new(book.clone())))
            .await;

        Ok(book)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parsing() {
        let sort: BookSort = "-price".parse().unwrap();
        assert_eq!(sort.field, SortField::Price);
        assert!(sort.descending);
        assert_eq!(sort.backend_param(), "price,desc");
        assert_eq!(sort.to_string(), "-price");

        let sort: BookSort = "Title".parse().unwrap();
        assert!(!sort.descending);
        assert_eq!(sort.backend_param(), "title,asc");

        assert!("rating".parse::<BookSort>().is_err());
    }

    #[test]
    fn test_query_defaults() {
        let query: BookQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query, BookQuery::default());
        assert_eq!(query.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_query_deserializes_sort_string() {
        let query: BookQuery =
            serde_json::from_value(serde_json::json!({ "page": 2, "sort": "-author" })).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.sort.unwrap().field, SortField::Author);

        let bad = serde_json::from_value::<BookQuery>(serde_json::json!({ "sort": "isbn" }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_normalized_clamps_size_and_drops_blank_search() {
        let query = BookQuery {
            size: 500,
            search: Some("   ".to_string()),
            ..BookQuery::default()
        }
        .normalized();
        assert_eq!(query.size, MAX_PAGE_SIZE);
        assert!(query.search.is_none());

        let query = BookQuery {
            size: 0,
            search: Some(" dune ".to_string()),
            ..BookQuery::default()
        }
        .normalized();
        assert_eq!(query.size, 1);
        assert_eq!(query.search.as_deref(), Some("dune"));
    }

    #[test]
    fn test_backend_path_encodes_search() {
        let query = BookQuery {
            search: Some("war & peace".to_string()),
            sort: Some("title".parse().unwrap()),
            ..BookQuery::default()
        };
        assert_eq!(
            query.backend_path(),
            "books?page=0&size=12&search=war+%26+peace&sort=title%2Casc"
        );
    }
}

//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use bookstore_core::{Book, BookId};

use crate::api::{BookPage, BookQuery};
use crate::error::Result;
use crate::state::AppState;

/// Catalog listing.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> Result<Json<BookPage>> {
    let page = state.api().list_books(&query.normalized()).await?;
    Ok(Json(page))
}

/// Book detail.
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Book>> {
    let book = state.api().get_book(BookId::new(id)).await?;
    Ok(Json(book))
}

//! Book CRUD, search, availability, and stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{BookAvailability, BookId, Money, StockUpdate};
use serde::{Deserialize, Serialize};

use crate::book::{Book, BookDraft, BookPatch};
use crate::error::ApiError;
use crate::service::{BookFilter, CatalogueService};
use crate::store::BookStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: BookStore> {
    pub catalogue: CatalogueService<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub publication_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub isbn: String,
    pub rating: Option<u8>,
    pub visible: bool,
    pub stock: u32,
    pub price_cents: i64,
}

impl BookRequest {
    fn into_draft(self) -> BookDraft {
        BookDraft {
            title: self.title,
            author: self.author,
            publication_date: self.publication_date,
            category: self.category,
            isbn: self.isbn,
            rating: self.rating,
            visible: self.visible,
            stock: self.stock,
            price: Money::from_cents(self.price_cents),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct BookPatchRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub rating: Option<u8>,
    pub visible: Option<bool>,
    pub stock: Option<u32>,
    pub price_cents: Option<i64>,
}

impl BookPatchRequest {
    fn into_patch(self) -> BookPatch {
        BookPatch {
            title: self.title,
            author: self.author,
            publication_date: self.publication_date,
            category: self.category,
            rating: self.rating,
            visible: self.visible,
            stock: self.stock,
            price: self.price_cents.map(Money::from_cents),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct SearchParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub rating_min: Option<u8>,
    pub rating_max: Option<u8>,
    pub visible: Option<bool>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub publication_date_from: Option<NaiveDate>,
    pub publication_date_to: Option<NaiveDate>,
    pub min_stock: Option<u32>,
}

impl SearchParams {
    fn into_filter(self) -> BookFilter {
        BookFilter {
            title: self.title,
            author: self.author,
            category: self.category,
            isbn: self.isbn,
            rating_min: self.rating_min,
            rating_max: self.rating_max,
            visible: self.visible,
            min_price: self.min_price_cents.map(Money::from_cents),
            max_price: self.max_price_cents.map(Money::from_cents),
            publication_date_from: self.publication_date_from,
            publication_date_to: self.publication_date_to,
            min_stock: self.min_stock,
        }
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct BookResponse {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub publication_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub isbn: String,
    pub rating: Option<u8>,
    pub visible: bool,
    pub stock: u32,
    pub price_cents: i64,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            publication_date: book.publication_date,
            category: book.category,
            isbn: book.isbn,
            rating: book.rating,
            visible: book.visible,
            stock: book.stock,
            price_cents: book.price.cents(),
        }
    }
}

// -- Handlers --

/// GET /books — list the whole catalogue.
#[tracing::instrument(skip(state))]
pub async fn list<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<BookResponse>> {
    let books = state.catalogue.list().await;
    Json(books.into_iter().map(BookResponse::from).collect())
}

/// GET /books/search — filtered catalogue query.
#[tracing::instrument(skip(state, params))]
pub async fn search<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<BookResponse>> {
    let books = state.catalogue.search(params.into_filter()).await;
    Json(books.into_iter().map(BookResponse::from).collect())
}

/// GET /books/:id — look up a single book.
#[tracing::instrument(skip(state))]
pub async fn get<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.catalogue.get(BookId::new(id)).await?;
    Ok(Json(book.into()))
}

/// POST /books — create a new book.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = state.catalogue.create(req.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// PUT /books/:id — full update (ISBN and id are never changed).
#[tracing::instrument(skip(state, req))]
pub async fn update<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state
        .catalogue
        .update(BookId::new(id), req.into_draft())
        .await?;
    Ok(Json(book.into()))
}

/// PATCH /books/:id — partial update.
#[tracing::instrument(skip(state, req))]
pub async fn patch<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<BookPatchRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state
        .catalogue
        .patch(BookId::new(id), req.into_patch())
        .await?;
    Ok(Json(book.into()))
}

/// DELETE /books/:id — remove a book.
#[tracing::instrument(skip(state))]
pub async fn delete<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalogue.delete(BookId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /books/:id/availability — point-in-time availability snapshot.
#[tracing::instrument(skip(state))]
pub async fn availability<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<BookAvailability>, ApiError> {
    let snapshot = state.catalogue.availability(BookId::new(id)).await?;
    Ok(Json(snapshot))
}

/// PATCH /books/:id/stock — apply a signed stock adjustment.
#[tracing::instrument(skip(state))]
pub async fn update_stock<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(update): Json<StockUpdate>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state
        .catalogue
        .update_stock(BookId::new(id), update.quantity)
        .await?;
    Ok(Json(book.into()))
}

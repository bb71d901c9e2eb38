//! Typed client for the catalogue service's HTTP surface.
//!
//! The orchestrator talks to the catalogue through the [`CatalogueClient`]
//! trait; production wiring uses [`HttpCatalogueClient`], tests use
//! [`InMemoryCatalogue`]. The client performs no retries and no caching —
//! each call is a single round trip reflecting catalogue state at call time.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{BookAvailability, BookId, StockUpdate};
use thiserror::Error;

/// Failures of a single catalogue round trip.
///
/// The variants stay distinguishable here even though the orchestrator folds
/// most of them into one caller-facing error; logs keep the detail.
#[derive(Debug, Error)]
pub enum CatalogueClientError {
    /// The catalogue could not be reached (connect, timeout, DNS).
    #[error("catalogue unreachable: {0}")]
    Unreachable(String),

    /// The catalogue answered 404 for the book.
    #[error("book {0} not found in catalogue")]
    BookNotFound(BookId),

    /// The catalogue answered with a non-success status.
    #[error("catalogue rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be decoded into the expected payload.
    #[error("invalid catalogue response: {0}")]
    InvalidResponse(String),
}

/// Remote operations the payments service needs from the catalogue.
#[async_trait]
pub trait CatalogueClient: Send + Sync {
    /// Fetches the current availability snapshot for a book.
    async fn availability(&self, book_id: BookId)
    -> Result<BookAvailability, CatalogueClientError>;

    /// Subtracts the purchased quantity from the book's stock.
    async fn decrement_stock(
        &self,
        book_id: BookId,
        quantity: u32,
    ) -> Result<(), CatalogueClientError>;
}

/// HTTP client wrapper for the catalogue service.
#[derive(Clone)]
pub struct HttpCatalogueClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogueClient {
    /// Creates a client for the catalogue at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CatalogueClient for HttpCatalogueClient {
    async fn availability(
        &self,
        book_id: BookId,
    ) -> Result<BookAvailability, CatalogueClientError> {
        let url = format!("{}/books/{}/availability", self.base_url, book_id);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogueClientError::Unreachable(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogueClientError::BookNotFound(book_id));
        }
        if !resp.status().is_success() {
            return Err(CatalogueClientError::Rejected {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        resp.json::<BookAvailability>()
            .await
            .map_err(|e| CatalogueClientError::InvalidResponse(e.to_string()))
    }

    async fn decrement_stock(
        &self,
        book_id: BookId,
        quantity: u32,
    ) -> Result<(), CatalogueClientError> {
        let url = format!("{}/books/{}/stock", self.base_url, book_id);
        let body = StockUpdate {
            quantity: -i64::from(quantity),
        };

        let resp = self
            .client
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CatalogueClientError::Unreachable(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogueClientError::BookNotFound(book_id));
        }
        if !resp.status().is_success() {
            return Err(CatalogueClientError::Rejected {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryCatalogueState {
    books: HashMap<BookId, StubBook>,
    availability_calls: u32,
    decrement_calls: u32,
    fail_on_availability: bool,
    fail_on_decrement: bool,
}

#[derive(Debug, Clone)]
struct StubBook {
    title: String,
    isbn: String,
    visible: bool,
    stock: i64,
    price_cents: i64,
}

/// In-memory catalogue double for testing.
///
/// Counts calls per operation so tests can assert that validation failures
/// make no remote calls, and supports failure injection plus an optional
/// decrement barrier for exercising the check-then-act stock race.
#[derive(Clone, Default)]
pub struct InMemoryCatalogue {
    state: Arc<RwLock<InMemoryCatalogueState>>,
    decrement_barrier: Arc<RwLock<Option<Arc<tokio::sync::Barrier>>>>,
}

impl InMemoryCatalogue {
    /// Creates a new empty catalogue double.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a book row to the double.
    pub fn add_book(
        &self,
        id: BookId,
        title: &str,
        isbn: &str,
        visible: bool,
        stock: u32,
        price_cents: i64,
    ) {
        self.state.write().unwrap().books.insert(
            id,
            StubBook {
                title: title.to_string(),
                isbn: isbn.to_string(),
                visible,
                stock: i64::from(stock),
                price_cents,
            },
        );
    }

    /// Configures the double to fail availability calls as unreachable.
    pub fn set_fail_on_availability(&self, fail: bool) {
        self.state.write().unwrap().fail_on_availability = fail;
    }

    /// Configures the double to fail decrement calls as unreachable.
    pub fn set_fail_on_decrement(&self, fail: bool) {
        self.state.write().unwrap().fail_on_decrement = fail;
    }

    /// Makes every decrement call wait on the barrier before applying.
    ///
    /// Lets a test hold concurrent purchases at the decrement step until all
    /// of them have passed the availability check on the same stale stock.
    pub fn set_decrement_barrier(&self, barrier: Arc<tokio::sync::Barrier>) {
        *self.decrement_barrier.write().unwrap() = Some(barrier);
    }

    /// Returns the number of availability calls made.
    pub fn availability_calls(&self) -> u32 {
        self.state.read().unwrap().availability_calls
    }

    /// Returns the number of decrement calls made.
    pub fn decrement_calls(&self) -> u32 {
        self.state.read().unwrap().decrement_calls
    }

    /// Returns the current stock for a book, if it exists.
    pub fn stock(&self, id: BookId) -> Option<i64> {
        self.state.read().unwrap().books.get(&id).map(|b| b.stock)
    }
}

#[async_trait]
impl CatalogueClient for InMemoryCatalogue {
    async fn availability(
        &self,
        book_id: BookId,
    ) -> Result<BookAvailability, CatalogueClientError> {
        let mut state = self.state.write().unwrap();
        state.availability_calls += 1;

        if state.fail_on_availability {
            return Err(CatalogueClientError::Unreachable(
                "connection refused".to_string(),
            ));
        }

        let book = state
            .books
            .get(&book_id)
            .ok_or(CatalogueClientError::BookNotFound(book_id))?;

        Ok(BookAvailability {
            id: book_id,
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            available: book.visible && book.stock > 0,
            visible: book.visible,
            stock: book.stock.max(0) as u32,
            price_cents: book.price_cents,
        })
    }

    async fn decrement_stock(
        &self,
        book_id: BookId,
        quantity: u32,
    ) -> Result<(), CatalogueClientError> {
        let barrier = self.decrement_barrier.read().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }

        let mut state = self.state.write().unwrap();
        state.decrement_calls += 1;

        if state.fail_on_decrement {
            return Err(CatalogueClientError::Unreachable(
                "connection refused".to_string(),
            ));
        }

        let book = state
            .books
            .get_mut(&book_id)
            .ok_or(CatalogueClientError::BookNotFound(book_id))?;

        let remaining = book.stock - i64::from(quantity);
        if remaining < 0 {
            return Err(CatalogueClientError::Rejected {
                status: 409,
                message: format!(
                    "stock update rejected for book {book_id}: adjustment -{quantity} exceeds stock {}",
                    book.stock
                ),
            });
        }

        book.stock = remaining;
        Ok(())
    }
}

//! Catalogue error types and their HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::BookId;
use thiserror::Error;

/// Errors produced by catalogue operations.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// No book exists with the given identifier.
    #[error("book {0} not found")]
    BookNotFound(BookId),

    /// A book with this ISBN already exists.
    #[error("ISBN already exists: {0}")]
    IsbnTaken(String),

    /// A stock adjustment would drive stock below zero.
    #[error("stock update rejected for book {book_id}: adjustment {delta} exceeds stock {stock}")]
    StockConflict {
        book_id: BookId,
        delta: i64,
        stock: u32,
    },

    /// A stock adjustment would push stock past the storable maximum.
    #[error("stock update rejected for book {book_id}: adjustment {delta} exceeds stock capacity")]
    StockOverflow { book_id: BookId, delta: i64 },
}

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Catalogue operation error.
    Catalogue(CatalogueError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Catalogue(err) => catalogue_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn catalogue_error_to_response(err: CatalogueError) -> (StatusCode, String) {
    match &err {
        CatalogueError::BookNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CatalogueError::IsbnTaken(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CatalogueError::StockConflict { .. } | CatalogueError::StockOverflow { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
    }
}

impl From<CatalogueError> for ApiError {
    fn from(err: CatalogueError) -> Self {
        ApiError::Catalogue(err)
    }
}

//! Payment error taxonomy and HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{BookId, PaymentId};
use thiserror::Error;

/// Errors produced by the payments service.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Malformed request: non-positive identifier or quantity.
    ///
    /// Recovered by caller correction, never retried automatically.
    #[error("invalid purchase request: {0}")]
    InvalidInput(String),

    /// The book is missing, hidden, out of stock, or the catalogue could not
    /// be reached. The causes are deliberately not distinguished to the
    /// caller — all of them block the purchase identically.
    #[error("book {book_id} was not found or is not available for sale")]
    BookUnavailable { book_id: BookId },

    /// Requested quantity exceeds the catalogue's available stock.
    #[error(
        "insufficient stock for '{book_title}': requested {requested}, available {available}"
    )]
    InsufficientStock {
        book_title: String,
        requested: u32,
        available: u32,
    },

    /// The remote stock decrement failed after the payment record was
    /// persisted; the record has been (best-effort) compensated away.
    #[error("stock update failed, payment cancelled: {cause}")]
    StockUpdateFailed { cause: String },

    /// No payment exists with the given identifier.
    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),
}

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Payment workflow error.
    Payment(PaymentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Payment(err) => payment_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match &err {
        PaymentError::InvalidInput(_)
        | PaymentError::BookUnavailable { .. }
        | PaymentError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        PaymentError::PaymentNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        PaymentError::StockUpdateFailed { .. } => {
            tracing::error!(error = %err, "purchase failed after durable write");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

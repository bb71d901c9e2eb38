//! Payment record and status.

use chrono::{DateTime, Utc};
use common::{BookId, Money, PaymentId, UserId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a payment.
///
/// Only `Pending` is reachable today: payments are created pending by the
/// purchase workflow and either stay that way or are deleted by
/// compensation. Transitions to `Completed`/`Cancelled` are future work;
/// the variants exist so stored records stay forward-compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl PaymentStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(PaymentStatus::Pending),
            "COMPLETED" => Some(PaymentStatus::Completed),
            "CANCELLED" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted purchase.
///
/// Book title, ISBN, and unit price are immutable copies captured from the
/// catalogue at purchase time, so historical payments stay stable even if
/// the book is later edited or removed. `total_price` is computed once at
/// creation and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub book_title: String,
    pub book_isbn: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
    pub purchase_date: DateTime<Utc>,
    pub status: PaymentStatus,
}

/// Payment fields as assembled by the orchestrator, before the store
/// assigns an identifier.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: UserId,
    pub book_id: BookId,
    pub book_title: String,
    pub book_isbn: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
    pub purchase_date: DateTime<Utc>,
    pub status: PaymentStatus,
}

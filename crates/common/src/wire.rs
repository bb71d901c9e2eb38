//! Wire payloads exchanged between the payments and catalogue services.

use serde::{Deserialize, Serialize};

use crate::{BookId, Money};

/// Point-in-time availability snapshot of a catalogue book.
///
/// Served by `GET /books/{id}/availability` and consumed by the payments
/// service before a purchase. `available` is derived by the catalogue as
/// `visible && stock > 0`; consumers must not re-derive it. The snapshot is
/// ephemeral — stock may change the moment it is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAvailability {
    pub id: BookId,
    pub title: String,
    pub isbn: String,
    pub available: bool,
    pub visible: bool,
    pub stock: u32,
    pub price_cents: i64,
}

impl BookAvailability {
    /// Returns the unit price as [`Money`].
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Signed stock adjustment applied by `PATCH /books/{id}/stock`.
///
/// Negative quantities decrement (a purchase), positive quantities restock.
/// The catalogue rejects adjustments that would drive stock below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub quantity: i64,
}

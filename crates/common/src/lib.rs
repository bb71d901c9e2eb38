//! Types shared between the catalogue and payments services.
//!
//! Holds the identifier newtypes, the integer-cents [`Money`] type, and the
//! wire DTOs that cross the service boundary ([`BookAvailability`] and
//! [`StockUpdate`]).

pub mod money;
pub mod types;
pub mod wire;

pub use money::Money;
pub use types::{BookId, PaymentId, UserId};
pub use wire::{BookAvailability, StockUpdate};

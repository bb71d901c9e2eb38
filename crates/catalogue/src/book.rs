//! Book record and its shaping types.

use chrono::NaiveDate;
use common::{BookAvailability, BookId, Money};
use serde::{Deserialize, Serialize};

/// A book in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub publication_date: Option<NaiveDate>,
    pub category: Option<String>,
    /// Unique across the catalogue, immutable after creation.
    pub isbn: String,
    pub rating: Option<u8>,
    /// Hidden books are kept in the store but never available for sale.
    pub visible: bool,
    pub stock: u32,
    pub price: Money,
}

impl Book {
    /// Returns the availability snapshot for this book.
    ///
    /// `available` is derived here, and only here: a book is available when
    /// it is visible and has stock left.
    pub fn availability(&self) -> BookAvailability {
        BookAvailability {
            id: self.id,
            title: self.title.clone(),
            isbn: self.isbn.clone(),
            available: self.visible && self.stock > 0,
            visible: self.visible,
            stock: self.stock,
            price_cents: self.price.cents(),
        }
    }

    /// Replaces every field except the identifier and ISBN.
    pub fn replace_with(&mut self, draft: BookDraft) {
        self.title = draft.title;
        self.author = draft.author;
        self.publication_date = draft.publication_date;
        self.category = draft.category;
        self.rating = draft.rating;
        self.visible = draft.visible;
        self.stock = draft.stock;
        self.price = draft.price;
    }

    /// Applies a partial update; only fields present in the patch change.
    pub fn apply_patch(&mut self, patch: BookPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(publication_date) = patch.publication_date {
            self.publication_date = Some(publication_date);
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(rating) = patch.rating {
            self.rating = Some(rating);
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}

/// Payload for creating a book or fully replacing one (the identifier is
/// store-assigned; the ISBN is only consulted at creation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub publication_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub isbn: String,
    pub rating: Option<u8>,
    pub visible: bool,
    pub stock: u32,
    pub price: Money,
}

/// Partial update; absent fields are left untouched.
///
/// Deliberately has no ISBN field — the ISBN never changes after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub rating: Option<u8>,
    pub visible: Option<bool>,
    pub stock: Option<u32>,
    pub price: Option<Money>,
}

//! Catalogue service layer: business rules over the book store.

use chrono::NaiveDate;
use common::{BookAvailability, BookId, Money};

use crate::book::{Book, BookDraft, BookPatch};
use crate::error::CatalogueError;
use crate::store::BookStore;

/// Optional criteria for a catalogue search; absent fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Case-insensitive substring match on the title.
    pub title: Option<String>,
    /// Case-insensitive substring match on the author.
    pub author: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub rating_min: Option<u8>,
    pub rating_max: Option<u8>,
    pub visible: Option<bool>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub publication_date_from: Option<NaiveDate>,
    pub publication_date_to: Option<NaiveDate>,
    pub min_stock: Option<u32>,
}

impl BookFilter {
    fn matches(&self, book: &Book) -> bool {
        if let Some(ref title) = self.title
            && !book.title.to_lowercase().contains(&title.to_lowercase())
        {
            return false;
        }
        if let Some(ref author) = self.author
            && !book.author.to_lowercase().contains(&author.to_lowercase())
        {
            return false;
        }
        if let Some(ref category) = self.category
            && book.category.as_deref() != Some(category.as_str())
        {
            return false;
        }
        if let Some(ref isbn) = self.isbn
            && &book.isbn != isbn
        {
            return false;
        }
        if let Some(min) = self.rating_min
            && book.rating.is_none_or(|r| r < min)
        {
            return false;
        }
        if let Some(max) = self.rating_max
            && book.rating.is_none_or(|r| r > max)
        {
            return false;
        }
        if let Some(visible) = self.visible
            && book.visible != visible
        {
            return false;
        }
        if let Some(min) = self.min_price
            && book.price < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && book.price > max
        {
            return false;
        }
        if let Some(from) = self.publication_date_from
            && book.publication_date.is_none_or(|d| d < from)
        {
            return false;
        }
        if let Some(to) = self.publication_date_to
            && book.publication_date.is_none_or(|d| d > to)
        {
            return false;
        }
        if let Some(min) = self.min_stock
            && book.stock < min
        {
            return false;
        }
        true
    }
}

/// Service for managing the book catalogue.
pub struct CatalogueService<S: BookStore> {
    store: S,
}

impl<S: BookStore> CatalogueService<S> {
    /// Creates a new catalogue service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns all books.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Vec<Book> {
        self.store.list().await
    }

    /// Looks up a book by identifier.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: BookId) -> Result<Book, CatalogueError> {
        self.store
            .get(id)
            .await
            .ok_or(CatalogueError::BookNotFound(id))
    }

    /// Creates a new book; ISBNs must be unique.
    #[tracing::instrument(skip(self, draft), fields(isbn = %draft.isbn))]
    pub async fn create(&self, draft: BookDraft) -> Result<Book, CatalogueError> {
        if self.store.isbn_exists(&draft.isbn).await {
            return Err(CatalogueError::IsbnTaken(draft.isbn));
        }
        let book = self.store.insert(draft).await;
        metrics::counter!("catalogue_books_created").increment(1);
        tracing::info!(book_id = %book.id, "book created");
        Ok(book)
    }

    /// Full update: replaces every field except identifier and ISBN.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update(&self, id: BookId, draft: BookDraft) -> Result<Book, CatalogueError> {
        let mut book = self.get(id).await?;
        book.replace_with(draft);
        // The book may vanish between the lookup and the write
        if !self.store.update(book.clone()).await {
            return Err(CatalogueError::BookNotFound(id));
        }
        Ok(book)
    }

    /// Partial update: only supplied fields change.
    #[tracing::instrument(skip(self, patch))]
    pub async fn patch(&self, id: BookId, patch: BookPatch) -> Result<Book, CatalogueError> {
        let mut book = self.get(id).await?;
        book.apply_patch(patch);
        if !self.store.update(book.clone()).await {
            return Err(CatalogueError::BookNotFound(id));
        }
        Ok(book)
    }

    /// Removes a book from the catalogue.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: BookId) -> Result<(), CatalogueError> {
        if !self.store.delete(id).await {
            return Err(CatalogueError::BookNotFound(id));
        }
        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }

    /// Filtered scan over the catalogue.
    #[tracing::instrument(skip(self, filter))]
    pub async fn search(&self, filter: BookFilter) -> Vec<Book> {
        self.store
            .list()
            .await
            .into_iter()
            .filter(|b| filter.matches(b))
            .collect()
    }

    /// Builds the availability snapshot for a book.
    #[tracing::instrument(skip(self))]
    pub async fn availability(&self, id: BookId) -> Result<BookAvailability, CatalogueError> {
        Ok(self.get(id).await?.availability())
    }

    /// Applies a signed stock adjustment.
    ///
    /// Rejects adjustments that would drive stock below zero; stock is never
    /// silently clamped.
    #[tracing::instrument(skip(self))]
    pub async fn update_stock(&self, id: BookId, delta: i64) -> Result<Book, CatalogueError> {
        let mut book = self.get(id).await?;

        // checked_add can only overflow on a huge positive delta: stock fits
        // in u32 and any negative delta keeps the sum above i64::MIN.
        let new_stock = match i64::from(book.stock).checked_add(delta) {
            Some(n) if n < 0 => {
                metrics::counter!("catalogue_stock_conflicts").increment(1);
                return Err(CatalogueError::StockConflict {
                    book_id: id,
                    delta,
                    stock: book.stock,
                });
            }
            Some(n) => match u32::try_from(n) {
                Ok(stock) => stock,
                Err(_) => {
                    metrics::counter!("catalogue_stock_conflicts").increment(1);
                    return Err(CatalogueError::StockOverflow { book_id: id, delta });
                }
            },
            None => {
                metrics::counter!("catalogue_stock_conflicts").increment(1);
                return Err(CatalogueError::StockOverflow { book_id: id, delta });
            }
        };

        book.stock = new_stock;
        if !self.store.update(book.clone()).await {
            return Err(CatalogueError::BookNotFound(id));
        }
        metrics::counter!("catalogue_stock_updates").increment(1);
        tracing::info!(book_id = %id, delta, stock = book.stock, "stock updated");
        Ok(book)
    }
}

//! Book record store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::BookId;
use tokio::sync::RwLock;

use crate::book::{Book, BookDraft};

/// Storage contract for book records.
///
/// The service layer owns all business rules; the store only does
/// identifier assignment and point lookups.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persists a new book and assigns its identifier.
    async fn insert(&self, draft: BookDraft) -> Book;

    /// Looks up a book by identifier.
    async fn get(&self, id: BookId) -> Option<Book>;

    /// Returns all books ordered by identifier.
    async fn list(&self) -> Vec<Book>;

    /// Replaces a stored book. Returns false if the identifier is unknown.
    async fn update(&self, book: Book) -> bool;

    /// Removes a book. Returns false if the identifier is unknown.
    async fn delete(&self, id: BookId) -> bool;

    /// Returns true if any stored book carries the given ISBN.
    async fn isbn_exists(&self, isbn: &str) -> bool;
}

#[derive(Debug, Default)]
struct InMemoryBookState {
    books: HashMap<BookId, Book>,
    next_id: i64,
}

/// In-memory book store backing the service (and its tests).
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookStore {
    state: Arc<RwLock<InMemoryBookState>>,
}

impl InMemoryBookStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored books.
    pub async fn count(&self) -> usize {
        self.state.read().await.books.len()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, draft: BookDraft) -> Book {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let book = Book {
            id: BookId::new(state.next_id),
            title: draft.title,
            author: draft.author,
            publication_date: draft.publication_date,
            category: draft.category,
            isbn: draft.isbn,
            rating: draft.rating,
            visible: draft.visible,
            stock: draft.stock,
            price: draft.price,
        };
        state.books.insert(book.id, book.clone());
        book
    }

    async fn get(&self, id: BookId) -> Option<Book> {
        self.state.read().await.books.get(&id).cloned()
    }

    async fn list(&self) -> Vec<Book> {
        let state = self.state.read().await;
        let mut books: Vec<_> = state.books.values().cloned().collect();
        books.sort_by_key(|b| b.id);
        books
    }

    async fn update(&self, book: Book) -> bool {
        let mut state = self.state.write().await;
        match state.books.get_mut(&book.id) {
            Some(slot) => {
                *slot = book;
                true
            }
            None => false,
        }
    }

    async fn delete(&self, id: BookId) -> bool {
        self.state.write().await.books.remove(&id).is_some()
    }

    async fn isbn_exists(&self, isbn: &str) -> bool {
        self.state
            .read()
            .await
            .books
            .values()
            .any(|b| b.isbn == isbn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn draft(isbn: &str) -> BookDraft {
        BookDraft {
            title: "Solaris".to_string(),
            author: "Stanislaw Lem".to_string(),
            publication_date: None,
            category: None,
            isbn: isbn.to_string(),
            rating: None,
            visible: true,
            stock: 3,
            price: Money::from_cents(899),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryBookStore::new();
        let a = store.insert(draft("isbn-a")).await;
        let b = store.insert(draft("isbn-b")).await;

        assert_eq!(a.id, BookId::new(1));
        assert_eq!(b.id, BookId::new(2));
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn get_and_delete_roundtrip() {
        let store = InMemoryBookStore::new();
        let book = store.insert(draft("isbn-a")).await;

        assert_eq!(store.get(book.id).await, Some(book.clone()));
        assert!(store.delete(book.id).await);
        assert_eq!(store.get(book.id).await, None);
        assert!(!store.delete(book.id).await);
    }

    #[tokio::test]
    async fn update_replaces_existing_only() {
        let store = InMemoryBookStore::new();
        let mut book = store.insert(draft("isbn-a")).await;
        book.stock = 10;

        assert!(store.update(book.clone()).await);
        assert_eq!(store.get(book.id).await.unwrap().stock, 10);

        book.id = BookId::new(99);
        assert!(!store.update(book).await);
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let store = InMemoryBookStore::new();
        store.insert(draft("isbn-a")).await;
        store.insert(draft("isbn-b")).await;
        store.insert(draft("isbn-c")).await;

        let ids: Vec<_> = store.list().await.into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BookId::new(1), BookId::new(2), BookId::new(3)]);
    }

    #[tokio::test]
    async fn isbn_lookup() {
        let store = InMemoryBookStore::new();
        store.insert(draft("isbn-a")).await;

        assert!(store.isbn_exists("isbn-a").await);
        assert!(!store.isbn_exists("isbn-z").await);
    }
}

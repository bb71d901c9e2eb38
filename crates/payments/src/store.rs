//! Payment record store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{PaymentId, UserId};
use tokio::sync::RwLock;

use crate::payment::{NewPayment, Payment};

/// Storage contract for payment records.
///
/// The purchase orchestrator depends only on `insert`, `get`, and `delete`
/// (the delete exists solely as a compensating action); the listing
/// operations back the read endpoints.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a new payment and assigns its identifier.
    async fn insert(&self, new: NewPayment) -> Payment;

    /// Looks up a payment by identifier.
    async fn get(&self, id: PaymentId) -> Option<Payment>;

    /// Returns all payments ordered by identifier.
    async fn list(&self) -> Vec<Payment>;

    /// Returns all payments for a user, ordered by identifier.
    async fn list_by_user(&self, user_id: UserId) -> Vec<Payment>;

    /// Removes a payment. Returns false if the identifier is unknown.
    async fn delete(&self, id: PaymentId) -> bool;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    payments: HashMap<PaymentId, Payment>,
    next_id: i64,
}

/// In-memory payment store backing the service (and its tests).
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStore {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored payments.
    pub async fn count(&self) -> usize {
        self.state.read().await.payments.len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, new: NewPayment) -> Payment {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let payment = Payment {
            id: PaymentId::new(state.next_id),
            user_id: new.user_id,
            book_id: new.book_id,
            book_title: new.book_title,
            book_isbn: new.book_isbn,
            quantity: new.quantity,
            unit_price: new.unit_price,
            total_price: new.total_price,
            purchase_date: new.purchase_date,
            status: new.status,
        };
        state.payments.insert(payment.id, payment.clone());
        payment
    }

    async fn get(&self, id: PaymentId) -> Option<Payment> {
        self.state.read().await.payments.get(&id).cloned()
    }

    async fn list(&self) -> Vec<Payment> {
        let state = self.state.read().await;
        let mut payments: Vec<_> = state.payments.values().cloned().collect();
        payments.sort_by_key(|p| p.id);
        payments
    }

    async fn list_by_user(&self, user_id: UserId) -> Vec<Payment> {
        let state = self.state.read().await;
        let mut payments: Vec<_> = state
            .payments
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.id);
        payments
    }

    async fn delete(&self, id: PaymentId) -> bool {
        self.state.write().await.payments.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{BookId, Money};

    use crate::payment::PaymentStatus;

    fn new_payment(user_id: i64) -> NewPayment {
        NewPayment {
            user_id: UserId::new(user_id),
            book_id: BookId::new(1),
            book_title: "Dune".to_string(),
            book_isbn: "isbn-1".to_string(),
            quantity: 1,
            unit_price: Money::from_cents(1000),
            total_price: Money::from_cents(1000),
            purchase_date: Utc::now(),
            status: PaymentStatus::Pending,
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryPaymentStore::new();
        let a = store.insert(new_payment(1)).await;
        let b = store.insert(new_payment(1)).await;

        assert_eq!(a.id, PaymentId::new(1));
        assert_eq!(b.id, PaymentId::new(2));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = InMemoryPaymentStore::new();
        let payment = store.insert(new_payment(1)).await;

        assert!(store.delete(payment.id).await);
        assert_eq!(store.get(payment.id).await, None);
        assert!(!store.delete(payment.id).await);
    }

    #[tokio::test]
    async fn list_by_user_filters() {
        let store = InMemoryPaymentStore::new();
        store.insert(new_payment(1)).await;
        store.insert(new_payment(2)).await;
        store.insert(new_payment(1)).await;

        let user_one = store.list_by_user(UserId::new(1)).await;
        assert_eq!(user_one.len(), 2);
        assert!(user_one.iter().all(|p| p.user_id == UserId::new(1)));

        assert_eq!(store.list().await.len(), 3);
    }
}

//! Purchase orchestrator: the cross-service purchase workflow.

use chrono::Utc;
use common::{BookId, Money, PaymentId, UserId};

use crate::catalogue::CatalogueClient;
use crate::error::PaymentError;
use crate::payment::{NewPayment, Payment, PaymentStatus};
use crate::state::PurchaseState;
use crate::store::PaymentStore;

/// A purchase submission: who buys which book, and how many copies.
///
/// Quantity arrives signed so that non-positive values reach the validation
/// gate instead of failing JSON decoding.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseRequest {
    pub user_id: UserId,
    pub book_id: BookId,
    pub quantity: i64,
}

/// Optional criteria for a payment search; absent fields do not filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentFilter {
    pub user_id: Option<UserId>,
    pub book_id: Option<BookId>,
    pub status: Option<PaymentStatus>,
}

/// A user's payments together with computed totals.
#[derive(Debug, Clone)]
pub struct UserPayments {
    pub user_id: UserId,
    pub payments: Vec<Payment>,
    pub total_payments: usize,
    pub total_amount: Money,
}

/// Reversing action registered for a durable side effect, run when a later
/// step of the purchase fails.
#[derive(Debug)]
enum Compensation {
    DeletePayment(PaymentId),
}

/// Orchestrates purchases against the catalogue and the payment store.
///
/// The purchase is a miniature saga: the pending payment record is persisted
/// before the remote stock decrement, and a compensating delete is
/// registered for it. There is no retry loop and no cross-call atomicity —
/// each attempt is one pass through [`PurchaseState`], and the only safety
/// net after the durable write is the best-effort compensation.
pub struct PaymentService<S, C>
where
    S: PaymentStore,
    C: CatalogueClient,
{
    store: S,
    catalogue: C,
}

impl<S, C> PaymentService<S, C>
where
    S: PaymentStore,
    C: CatalogueClient,
{
    /// Creates a new payment service over the given collaborators.
    pub fn new(store: S, catalogue: C) -> Self {
        Self { store, catalogue }
    }

    /// Executes the purchase workflow.
    ///
    /// Steps run in order with no step skipped and none retried: validate,
    /// fetch the availability snapshot, gate on availability and stock,
    /// capture the price from the snapshot, persist the pending record,
    /// decrement remote stock, compensate on decrement failure.
    #[tracing::instrument(skip(self), fields(user_id = %req.user_id, book_id = %req.book_id))]
    pub async fn create(&self, req: PurchaseRequest) -> Result<Payment, PaymentError> {
        metrics::counter!("purchase_attempts").increment(1);
        let attempt_start = std::time::Instant::now();

        let mut state = PurchaseState::Validating;
        tracing::debug!(%state, "purchase attempt started");

        if !req.user_id.is_positive() {
            return Err(PaymentError::InvalidInput(
                "userId must be greater than 0".to_string(),
            ));
        }
        if !req.book_id.is_positive() {
            return Err(PaymentError::InvalidInput(
                "bookId must be greater than 0".to_string(),
            ));
        }
        if req.quantity <= 0 {
            return Err(PaymentError::InvalidInput(
                "quantity must be greater than 0".to_string(),
            ));
        }
        // Quantities are stored as u32; larger values must fail here, not
        // truncate into a zero-copy purchase.
        let quantity = u32::try_from(req.quantity).map_err(|_| {
            PaymentError::InvalidInput(format!(
                "quantity {} exceeds the supported maximum {}",
                req.quantity,
                u32::MAX
            ))
        })?;

        state = PurchaseState::CheckingAvailability;
        tracing::debug!(%state, "fetching availability snapshot");

        // Missing book and unreachable catalogue fold into one error: both
        // block the purchase identically from the caller's point of view.
        let snapshot = match self.catalogue.availability(req.book_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(%state, error = %e, "availability check failed");
                metrics::counter!("purchase_failed", "reason" => "unavailable").increment(1);
                return Err(PaymentError::BookUnavailable {
                    book_id: req.book_id,
                });
            }
        };

        if !snapshot.available {
            tracing::info!(%state, title = %snapshot.title, "book not available for sale");
            metrics::counter!("purchase_failed", "reason" => "unavailable").increment(1);
            return Err(PaymentError::BookUnavailable {
                book_id: req.book_id,
            });
        }

        if snapshot.stock < quantity {
            metrics::counter!("purchase_failed", "reason" => "insufficient_stock").increment(1);
            return Err(PaymentError::InsufficientStock {
                book_title: snapshot.title,
                requested: quantity,
                available: snapshot.stock,
            });
        }

        // Price comes from the snapshot, never from the caller.
        let unit_price = snapshot.price();
        let total_price = unit_price.checked_mul(quantity).ok_or_else(|| {
            PaymentError::InvalidInput(format!(
                "total price for quantity {quantity} overflows the supported range"
            ))
        })?;

        state = PurchaseState::Reserving;
        tracing::debug!(%state, "persisting pending payment");

        // The durable write deliberately precedes the remote decrement: a
        // local fact is established before the cross-service side effect.
        let payment = self
            .store
            .insert(NewPayment {
                user_id: req.user_id,
                book_id: req.book_id,
                book_title: snapshot.title,
                book_isbn: snapshot.isbn,
                quantity,
                unit_price,
                total_price,
                purchase_date: Utc::now(),
                status: PaymentStatus::Pending,
            })
            .await;
        let mut compensations = vec![Compensation::DeletePayment(payment.id)];

        state = PurchaseState::DecrementingStock;
        tracing::debug!(%state, payment_id = %payment.id, "applying remote stock decrement");

        if let Err(e) = self.catalogue.decrement_stock(req.book_id, quantity).await {
            state = PurchaseState::Compensating;
            tracing::warn!(%state, payment_id = %payment.id, error = %e, "stock decrement failed");

            self.compensate(&mut compensations).await;

            state = PurchaseState::Failed;
            metrics::counter!("purchase_failed", "reason" => "stock_update").increment(1);
            metrics::histogram!("purchase_duration_seconds")
                .record(attempt_start.elapsed().as_secs_f64());
            tracing::warn!(%state, payment_id = %payment.id, "purchase attempt failed");
            return Err(PaymentError::StockUpdateFailed {
                cause: e.to_string(),
            });
        }

        state = PurchaseState::Committed;
        metrics::counter!("purchase_committed").increment(1);
        metrics::histogram!("purchase_duration_seconds")
            .record(attempt_start.elapsed().as_secs_f64());
        tracing::info!(
            %state,
            payment_id = %payment.id,
            total_cents = payment.total_price.cents(),
            "purchase committed"
        );

        Ok(payment)
    }

    /// Runs registered compensations in reverse order of registration.
    ///
    /// Best effort only: a compensation that finds nothing to undo is logged
    /// and swallowed. If the compensating delete fails, an orphaned PENDING
    /// record remains pointing at stock that was never decremented — an
    /// accepted gap in this design, surfaced in logs rather than to the
    /// caller.
    async fn compensate(&self, compensations: &mut Vec<Compensation>) {
        while let Some(compensation) = compensations.pop() {
            match compensation {
                Compensation::DeletePayment(id) => {
                    if self.store.delete(id).await {
                        tracing::info!(payment_id = %id, "compensating delete applied");
                    } else {
                        tracing::error!(
                            payment_id = %id,
                            "compensating delete found no record; a pending payment may be orphaned"
                        );
                    }
                }
            }
        }
    }

    /// Looks up a payment by identifier.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: PaymentId) -> Result<Payment, PaymentError> {
        self.store
            .get(id)
            .await
            .ok_or(PaymentError::PaymentNotFound(id))
    }

    /// Returns all payments.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Vec<Payment> {
        self.store.list().await
    }

    /// Returns a user's payments with computed totals.
    #[tracing::instrument(skip(self))]
    pub async fn user_payments(&self, user_id: UserId) -> UserPayments {
        let payments = self.store.list_by_user(user_id).await;

        let total_payments = payments.len();
        let mut total_amount = Money::zero();
        for payment in &payments {
            total_amount += payment.total_price;
        }

        UserPayments {
            user_id,
            payments,
            total_payments,
            total_amount,
        }
    }

    /// Filtered scan over all payments.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, filter: PaymentFilter) -> Vec<Payment> {
        self.store
            .list()
            .await
            .into_iter()
            .filter(|p| {
                filter.user_id.is_none_or(|u| p.user_id == u)
                    && filter.book_id.is_none_or(|b| p.book_id == b)
                    && filter.status.is_none_or(|s| p.status == s)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalogue::InMemoryCatalogue;
    use crate::store::InMemoryPaymentStore;

    fn setup() -> (
        PaymentService<InMemoryPaymentStore, InMemoryCatalogue>,
        InMemoryPaymentStore,
        InMemoryCatalogue,
    ) {
        let store = InMemoryPaymentStore::new();
        let catalogue = InMemoryCatalogue::new();
        let service = PaymentService::new(store.clone(), catalogue.clone());
        (service, store, catalogue)
    }

    fn request(user_id: i64, book_id: i64, quantity: i64) -> PurchaseRequest {
        PurchaseRequest {
            user_id: UserId::new(user_id),
            book_id: BookId::new(book_id),
            quantity,
        }
    }

    #[tokio::test]
    async fn happy_path_captures_snapshot_price() {
        let (service, store, catalogue) = setup();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 5, 1000);

        let before = Utc::now();
        let payment = service.create(request(7, 1, 3)).await.unwrap();

        assert_eq!(payment.unit_price, Money::from_cents(1000));
        assert_eq!(payment.total_price, Money::from_cents(3000));
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.book_title, "Dune");
        assert_eq!(payment.book_isbn, "isbn-1");
        assert!(payment.purchase_date >= before);

        assert_eq!(store.count().await, 1);
        assert_eq!(catalogue.stock(BookId::new(1)), Some(2));
    }

    #[tokio::test]
    async fn invalid_input_makes_no_remote_calls() {
        let (service, store, catalogue) = setup();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 5, 1000);

        for req in [request(0, 1, 1), request(1, -2, 1), request(1, 1, 0)] {
            let err = service.create(req).await.unwrap_err();
            assert!(matches!(err, PaymentError::InvalidInput(_)));
        }

        assert_eq!(catalogue.availability_calls(), 0);
        assert_eq!(catalogue.decrement_calls(), 0);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn quantity_above_u32_is_rejected_before_remote_calls() {
        let (service, store, catalogue) = setup();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 5, 1000);

        // Would truncate to 0 if cast instead of converted
        let err = service
            .create(request(1, 1, i64::from(u32::MAX) + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));

        assert_eq!(catalogue.availability_calls(), 0);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn hidden_book_is_unavailable() {
        let (service, store, catalogue) = setup();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", false, 5, 1000);

        let err = service.create(request(1, 1, 1)).await.unwrap_err();
        assert!(matches!(err, PaymentError::BookUnavailable { .. }));
        assert_eq!(store.count().await, 0);
        assert_eq!(catalogue.decrement_calls(), 0);
    }

    #[tokio::test]
    async fn missing_book_and_unreachable_catalogue_fold_together() {
        let (service, _, catalogue) = setup();

        // Unknown book
        let err = service.create(request(1, 9, 1)).await.unwrap_err();
        assert!(matches!(err, PaymentError::BookUnavailable { .. }));

        // Catalogue down
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 5, 1000);
        catalogue.set_fail_on_availability(true);
        let err = service.create(request(1, 1, 1)).await.unwrap_err();
        assert!(matches!(err, PaymentError::BookUnavailable { .. }));
    }

    #[tokio::test]
    async fn insufficient_stock_reports_both_quantities() {
        let (service, store, catalogue) = setup();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 5, 1000);

        let err = service.create(request(1, 1, 6)).await.unwrap_err();
        match err {
            PaymentError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(store.count().await, 0);
        assert_eq!(catalogue.decrement_calls(), 0);
    }

    #[tokio::test]
    async fn decrement_failure_compensates_the_pending_record() {
        let (service, store, catalogue) = setup();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 5, 1000);
        catalogue.set_fail_on_decrement(true);

        let err = service.create(request(1, 1, 2)).await.unwrap_err();
        assert!(matches!(err, PaymentError::StockUpdateFailed { .. }));

        // The record persisted in step 6 must be gone
        assert_eq!(store.count().await, 0);
        let lookup = service.get(PaymentId::new(1)).await.unwrap_err();
        assert!(matches!(lookup, PaymentError::PaymentNotFound(_)));

        // Stock was never decremented
        assert_eq!(catalogue.stock(BookId::new(1)), Some(5));
    }

    /// Store whose deletes never succeed, standing in for a record that has
    /// vanished (or a store refusing the delete) at compensation time.
    #[derive(Clone)]
    struct UndeletablePaymentStore {
        inner: InMemoryPaymentStore,
    }

    #[async_trait::async_trait]
    impl PaymentStore for UndeletablePaymentStore {
        async fn insert(&self, new: NewPayment) -> Payment {
            self.inner.insert(new).await
        }

        async fn get(&self, id: PaymentId) -> Option<Payment> {
            self.inner.get(id).await
        }

        async fn list(&self) -> Vec<Payment> {
            self.inner.list().await
        }

        async fn list_by_user(&self, user_id: UserId) -> Vec<Payment> {
            self.inner.list_by_user(user_id).await
        }

        async fn delete(&self, _id: PaymentId) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn failed_compensation_leaves_orphaned_pending_record() {
        let inner = InMemoryPaymentStore::new();
        let catalogue = InMemoryCatalogue::new();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 5, 1000);
        catalogue.set_fail_on_decrement(true);

        let store = UndeletablePaymentStore {
            inner: inner.clone(),
        };
        let service = PaymentService::new(store, catalogue.clone());

        let err = service.create(request(1, 1, 2)).await.unwrap_err();
        assert!(matches!(err, PaymentError::StockUpdateFailed { .. }));

        // Compensation is best effort: the failed delete is only logged, the
        // caller still sees the decrement failure, and the PENDING record
        // stays behind pointing at stock that was never decremented.
        assert_eq!(inner.count().await, 1);
        let orphan = inner.get(PaymentId::new(1)).await.unwrap();
        assert_eq!(orphan.status, PaymentStatus::Pending);
        assert_eq!(catalogue.stock(BookId::new(1)), Some(5));
    }

    #[tokio::test]
    async fn purchase_is_not_idempotent() {
        let (service, store, catalogue) = setup();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 10, 1000);

        let first = service.create(request(1, 1, 2)).await.unwrap();
        let second = service.create(request(1, 1, 2)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.count().await, 2);
        assert_eq!(catalogue.stock(BookId::new(1)), Some(6));
    }

    #[tokio::test]
    async fn concurrent_purchases_race_on_stale_snapshots() {
        let store = InMemoryPaymentStore::new();
        let catalogue = InMemoryCatalogue::new();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 5, 1000);

        // Hold both attempts at the decrement step until each has passed the
        // sufficiency check against the same (stale) stock of 5.
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        catalogue.set_decrement_barrier(barrier);

        let service = Arc::new(PaymentService::new(store.clone(), catalogue.clone()));

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.create(request(1, 1, 3)).await }
        });
        let second = tokio::spawn({
            let service = service.clone();
            async move { service.create(request(2, 1, 3)).await }
        });

        let first = first.await.unwrap();
        let second = second.await.unwrap();

        // Both passed the check-then-act gate on stale data
        assert_eq!(catalogue.availability_calls(), 2);
        assert_eq!(catalogue.decrement_calls(), 2);

        // The catalogue's floor rejects the loser, whose record is compensated
        let committed = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(committed, 1);
        let loser = if first.is_err() { first } else { second };
        assert!(matches!(
            loser.unwrap_err(),
            PaymentError::StockUpdateFailed { .. }
        ));

        assert_eq!(store.count().await, 1);
        assert_eq!(catalogue.stock(BookId::new(1)), Some(2));
    }

    #[tokio::test]
    async fn user_payments_totals() {
        let (service, _, catalogue) = setup();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 10, 1000);
        catalogue.add_book(BookId::new(2), "Hyperion", "isbn-2", true, 10, 800);

        service.create(request(1, 1, 2)).await.unwrap();
        service.create(request(1, 2, 1)).await.unwrap();
        service.create(request(2, 1, 1)).await.unwrap();

        let summary = service.user_payments(UserId::new(1)).await;
        assert_eq!(summary.total_payments, 2);
        assert_eq!(summary.total_amount, Money::from_cents(2800));

        let empty = service.user_payments(UserId::new(9)).await;
        assert_eq!(empty.total_payments, 0);
        assert_eq!(empty.total_amount, Money::zero());
    }

    #[tokio::test]
    async fn search_filters_payments() {
        let (service, _, catalogue) = setup();
        catalogue.add_book(BookId::new(1), "Dune", "isbn-1", true, 10, 1000);
        catalogue.add_book(BookId::new(2), "Hyperion", "isbn-2", true, 10, 800);

        service.create(request(1, 1, 1)).await.unwrap();
        service.create(request(1, 2, 1)).await.unwrap();
        service.create(request(2, 1, 1)).await.unwrap();

        let by_user = service
            .search(PaymentFilter {
                user_id: Some(UserId::new(1)),
                ..PaymentFilter::default()
            })
            .await;
        assert_eq!(by_user.len(), 2);

        let by_user_and_book = service
            .search(PaymentFilter {
                user_id: Some(UserId::new(1)),
                book_id: Some(BookId::new(2)),
                ..PaymentFilter::default()
            })
            .await;
        assert_eq!(by_user_and_book.len(), 1);

        let pending = service
            .search(PaymentFilter {
                status: Some(PaymentStatus::Pending),
                ..PaymentFilter::default()
            })
            .await;
        assert_eq!(pending.len(), 3);

        let cancelled = service
            .search(PaymentFilter {
                status: Some(PaymentStatus::Cancelled),
                ..PaymentFilter::default()
            })
            .await;
        assert!(cancelled.is_empty());
    }
}

//! Purchase and payment read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{BookId, PaymentId, UserId};
use serde::{Deserialize, Serialize};

use crate::catalogue::CatalogueClient;
use crate::error::ApiError;
use crate::orchestrator::{PaymentFilter, PaymentService, PurchaseRequest, UserPayments};
use crate::payment::{Payment, PaymentStatus};
use crate::store::PaymentStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: PaymentStore, C: CatalogueClient> {
    pub payments: PaymentService<S, C>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PurchaseBody {
    pub user_id: i64,
    pub book_id: i64,
    pub quantity: i64,
}

impl PurchaseBody {
    fn into_request(self) -> PurchaseRequest {
        PurchaseRequest {
            user_id: UserId::new(self.user_id),
            book_id: BookId::new(self.book_id),
            quantity: self.quantity,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct SearchParams {
    pub user_id: Option<i64>,
    pub book_id: Option<i64>,
    pub status: Option<String>,
}

impl SearchParams {
    fn into_filter(self) -> Result<PaymentFilter, ApiError> {
        let status = match self.status {
            Some(raw) => Some(
                PaymentStatus::parse(&raw)
                    .ok_or_else(|| ApiError::BadRequest(format!("unknown status '{raw}'")))?,
            ),
            None => None,
        };
        Ok(PaymentFilter {
            user_id: self.user_id.map(UserId::new),
            book_id: self.book_id.map(BookId::new),
            status,
        })
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub book_title: String,
    pub book_isbn: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub purchase_date: DateTime<Utc>,
    pub status: PaymentStatus,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            user_id: payment.user_id,
            book_id: payment.book_id,
            book_title: payment.book_title,
            book_isbn: payment.book_isbn,
            quantity: payment.quantity,
            unit_price_cents: payment.unit_price.cents(),
            total_price_cents: payment.total_price.cents(),
            purchase_date: payment.purchase_date,
            status: payment.status,
        }
    }
}

#[derive(Serialize)]
pub struct UserPaymentsResponse {
    pub user_id: UserId,
    pub payments: Vec<PaymentResponse>,
    pub total_payments: usize,
    pub total_amount_cents: i64,
}

impl From<UserPayments> for UserPaymentsResponse {
    fn from(summary: UserPayments) -> Self {
        Self {
            user_id: summary.user_id,
            payments: summary
                .payments
                .into_iter()
                .map(PaymentResponse::from)
                .collect(),
            total_payments: summary.total_payments,
            total_amount_cents: summary.total_amount.cents(),
        }
    }
}

// -- Handlers --

/// POST /payments — execute a purchase.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: PaymentStore, C: CatalogueClient>(
    State(state): State<Arc<AppState<S, C>>>,
    Json(body): Json<PurchaseBody>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let payment = state.payments.create(body.into_request()).await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// GET /payments — list all payments.
#[tracing::instrument(skip(state))]
pub async fn list<S: PaymentStore, C: CatalogueClient>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Json<Vec<PaymentResponse>> {
    let payments = state.payments.list().await;
    Json(payments.into_iter().map(PaymentResponse::from).collect())
}

/// GET /payments/search — filtered payment query.
#[tracing::instrument(skip(state, params))]
pub async fn search<S: PaymentStore, C: CatalogueClient>(
    State(state): State<Arc<AppState<S, C>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = state.payments.search(params.into_filter()?).await;
    Ok(Json(
        payments.into_iter().map(PaymentResponse::from).collect(),
    ))
}

/// GET /payments/:id — look up a single payment.
#[tracing::instrument(skip(state))]
pub async fn get<S: PaymentStore, C: CatalogueClient>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<i64>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = state.payments.get(PaymentId::new(id)).await?;
    Ok(Json(payment.into()))
}

/// GET /payments/user/:user_id — a user's payments with totals.
#[tracing::instrument(skip(state))]
pub async fn by_user<S: PaymentStore, C: CatalogueClient>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(user_id): Path<i64>,
) -> Json<UserPaymentsResponse> {
    let summary = state.payments.user_payments(UserId::new(user_id)).await;
    Json(summary.into())
}

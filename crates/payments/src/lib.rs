//! Payments service.
//!
//! Owns purchase execution: it validates requests, checks book availability
//! against the catalogue service, persists a PENDING payment record, applies
//! the remote stock decrement, and compensates the record away when the
//! decrement fails. Read endpoints expose payments by id, by user, and by
//! filter.

pub mod catalogue;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod payment;
pub mod routes;
pub mod state;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use catalogue::{CatalogueClient, HttpCatalogueClient};
use orchestrator::PaymentService;
use routes::payments::AppState;
use store::{InMemoryPaymentStore, PaymentStore};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, C>(state: Arc<AppState<S, C>>, metrics_handle: PrometheusHandle) -> Router
where
    S: PaymentStore + 'static,
    C: CatalogueClient + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/payments",
            get(routes::payments::list::<S, C>).post(routes::payments::create::<S, C>),
        )
        .route("/payments/search", get(routes::payments::search::<S, C>))
        .route("/payments/{id}", get(routes::payments::get::<S, C>))
        .route(
            "/payments/user/{user_id}",
            get(routes::payments::by_user::<S, C>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given store and catalogue client.
pub fn create_state<S, C>(store: S, catalogue: C) -> Arc<AppState<S, C>>
where
    S: PaymentStore,
    C: CatalogueClient,
{
    Arc::new(AppState {
        payments: PaymentService::new(store, catalogue),
    })
}

/// Creates the default state: in-memory store, HTTP catalogue client.
pub fn create_default_state(
    catalogue_url: impl Into<String>,
) -> Arc<AppState<InMemoryPaymentStore, HttpCatalogueClient>> {
    create_state(
        InMemoryPaymentStore::new(),
        HttpCatalogueClient::new(catalogue_url),
    )
}

//! Book catalogue service.
//!
//! Owns book records (title, stock, visibility, price) and exposes the
//! availability and stock-adjustment operations the payments service
//! purchases against, plus the usual CRUD and search surface.

pub mod book;
pub mod config;
pub mod error;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::books::AppState;
use service::CatalogueService;
use store::{BookStore, InMemoryBookStore};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: BookStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/books",
            get(routes::books::list::<S>).post(routes::books::create::<S>),
        )
        .route("/books/search", get(routes::books::search::<S>))
        .route(
            "/books/{id}",
            get(routes::books::get::<S>)
                .put(routes::books::update::<S>)
                .patch(routes::books::patch::<S>)
                .delete(routes::books::delete::<S>),
        )
        .route(
            "/books/{id}/availability",
            get(routes::books::availability::<S>),
        )
        .route("/books/{id}/stock", patch(routes::books::update_stock::<S>))
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

/// Creates the default application state over an in-memory book store.
pub fn create_default_state() -> Arc<AppState<InMemoryBookStore>> {
    Arc::new(AppState {
        catalogue: CatalogueService::new(InMemoryBookStore::new()),
    })
}

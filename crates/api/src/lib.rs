//! HTTP API server for the storefront.
//!
//! Serves catalog reads and order placement over a [`Store`] chosen at
//! startup, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use checkout::OrderPlacer;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub placer: OrderPlacer<S>,
    /// Name of the store implementation, reported by `/health`.
    pub backend: &'static str,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, backend: &'static str) -> Self {
        Self {
            placer: OrderPlacer::new(store),
            backend,
        }
    }

    pub fn store(&self) -> &S {
        self.placer.store()
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/collections", get(routes::catalog::list_collections::<S>))
        .route("/products", get(routes::catalog::list_products::<S>))
        .route("/products/{slug}", get(routes::catalog::get_product::<S>))
        .route("/orders", post(routes::orders::create::<S>));

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .nest("/api", api)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

//! HTTP API server for order creation and inventory.
//!
//! Provides REST endpoints for placing orders through the saga, reading
//! orders back, inspecting and adjusting stock, and listing orphaned
//! deductions, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, LogFormat};
pub use error::{ApiError, StartupError};
pub use state::{AppState, InMemoryBackend, create_default_state, create_postgres_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route("/orders", post(routes::orders::create))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/inventory/{product_id}", get(routes::inventory::get))
        .route("/inventory/{product_id}/adjust", post(routes::inventory::adjust))
        .route(
            "/admin/orphaned-deductions",
            get(routes::admin::orphaned_deductions),
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

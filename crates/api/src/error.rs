//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ledger::LedgerError;
use saga::{OrderError, ServiceError};
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The caller did not identify itself.
    Unauthorized(String),
    /// Order creation failed.
    Order(OrderError),
    /// Direct ledger access failed.
    Ledger(LedgerError),
    /// A collaborator failed outside order creation.
    Service(ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Order(err) => (order_status(&err), err.to_string()),
            ApiError::Ledger(err) => (ledger_status(&err), err.to_string()),
            ApiError::Service(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::EmptyCart | OrderError::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
        OrderError::ProductUnavailable { .. } => StatusCode::NOT_FOUND,
        OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
        OrderError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        OrderError::PersistenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InsufficientStock { .. } => StatusCode::CONFLICT,
        LedgerError::Overflow(_) => StatusCode::BAD_REQUEST,
        LedgerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Database(_) | LedgerError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ledger setup failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Metrics recorder setup failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

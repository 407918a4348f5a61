//! Projection error types.

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during projection processing.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Failed to decode an event payload.
    #[error("Event decoding error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Applying the order would overflow a running total. The view is left
    /// unchanged.
    #[error("Amount overflow applying order {0}")]
    Overflow(OrderId),

    /// A projection-specific error.
    #[error("Projection error: {0}")]
    Projection(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

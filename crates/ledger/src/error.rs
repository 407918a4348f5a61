use thiserror::Error;

use crate::ProductId;

/// Errors that can occur when adjusting or reading stock.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The adjustment would drive the quantity below zero.
    /// The ledger state is unchanged.
    #[error(
        "Insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: u64,
    },

    /// The adjustment would overflow the stored quantity.
    #[error("Quantity overflow for product {0}")]
    Overflow(ProductId),

    /// The ledger could not be reached or refused the request.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl LedgerError {
    /// Returns true if this error is the non-negativity rejection.
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, LedgerError::InsufficientStock { .. })
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

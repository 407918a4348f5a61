//! Operator endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use saga::{OrphanedDeduction, ReconciliationLog};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /admin/orphaned-deductions — deductions compensation could not return.
pub async fn orphaned_deductions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrphanedDeduction>>, ApiError> {
    Ok(Json(state.reconciliation.entries().await?))
}

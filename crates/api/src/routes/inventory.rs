//! Stock lookup and adjustment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use ledger::InventoryLedger;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AdjustRequest {
    /// Positive to restock, negative to deduct.
    pub delta: i64,
}

#[derive(Serialize)]
pub struct StockResponse {
    pub product_id: String,
    pub quantity: i64,
}

/// GET /inventory/{product_id} — current stock; unknown products read as 0.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    let quantity = state
        .ledger
        .get_quantity(&ProductId::new(product_id.as_str()))
        .await?;
    Ok(Json(StockResponse {
        product_id,
        quantity,
    }))
}

/// POST /inventory/{product_id}/adjust — apply a signed stock delta.
#[tracing::instrument(skip(state, req))]
pub async fn adjust(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Json(req): Json<AdjustRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    let quantity = state
        .ledger
        .adjust(&ProductId::new(product_id.as_str()), req.delta)
        .await?;
    Ok(Json(StockResponse {
        product_id,
        quantity,
    }))
}

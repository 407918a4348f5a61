//! Order creation and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{CartItem, Order};
use saga::OrderStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated user, set by the gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<CartItemRequest>,
}

#[derive(Deserialize)]
pub struct CartItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    /// Null if the line total does not fit in cents.
    pub subtotal_cents: Option<i64>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            status: order.status.to_string(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                    subtotal_cents: item.subtotal().map(|subtotal| subtotal.cents()),
                })
                .collect(),
            total_cents: order.total_amount.cents(),
            created_at: order.created_at,
        }
    }
}

// -- Handlers --

/// POST /orders — place an order for the calling user.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user_id = user_id_from(&headers)?;
    let items = req
        .items
        .into_iter()
        .map(|item| CartItem::new(item.product_id, item.quantity))
        .collect();

    let order = state
        .orchestrator
        .create_order_within(user_id, items, state.order_deadline)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders/{id} — load a persisted order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders — list persisted orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

fn user_id_from(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(UserId::from)
        .ok_or_else(|| ApiError::Unauthorized(format!("Missing {USER_ID_HEADER} header")))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    uuid::Uuid::parse_str(id)
        .map(OrderId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}

//! User orders read model: per-user order history and spend.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, UserId};
use domain::OrderEvent;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::error::ProjectionError;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Per-user order statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserOrders {
    pub user_id: UserId,
    pub total_orders: u64,
    pub total_spent: Money,
    /// Order IDs in the order their events arrived.
    pub order_ids: Vec<OrderId>,
    pub last_order_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct UserOrdersState {
    users: HashMap<UserId, UserOrders>,
    seen_orders: HashSet<OrderId>,
    position: ProjectionPosition,
}

/// Read model view for per-user order statistics.
#[derive(Clone, Default)]
pub struct UserOrdersView {
    state: Arc<RwLock<UserOrdersState>>,
}

impl UserOrdersView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_user(&self, user_id: &UserId) -> Option<UserOrders> {
        self.state.read().await.users.get(user_id).cloned()
    }

    /// Returns the users with the highest spend.
    pub async fn top_spenders(&self, limit: usize) -> Vec<UserOrders> {
        let state = self.state.read().await;
        let mut users: Vec<_> = state.users.values().cloned().collect();
        users.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
        users.truncate(limit);
        users
    }
}

#[async_trait]
impl Projection for UserOrdersView {
    fn name(&self) -> &'static str {
        "UserOrdersView"
    }

    async fn handle(&self, event: &OrderEvent) -> Result<()> {
        let mut state = self.state.write().await;

        let OrderEvent::OrderCreatedV1(data) = event;
        if state.seen_orders.contains(&data.order_id) {
            state.position = state.position.duplicate();
            return Ok(());
        }
        let spent = state
            .users
            .get(&data.user_id)
            .map_or(Money::zero(), |summary| summary.total_spent);
        let total_spent = spent
            .checked_add(data.total_amount)
            .ok_or(ProjectionError::Overflow(data.order_id))?;
        state.seen_orders.insert(data.order_id);
        state.position = state.position.applied(data.order_id);

        let summary = state
            .users
            .entry(data.user_id.clone())
            .or_insert_with(|| UserOrders {
                user_id: data.user_id.clone(),
                total_orders: 0,
                total_spent: Money::zero(),
                order_ids: Vec::new(),
                last_order_at: None,
            });
        summary.total_orders += 1;
        summary.total_spent = total_spent;
        summary.order_ids.push(data.order_id);
        if summary.last_order_at.is_none_or(|at| at < data.created_at) {
            summary.last_order_at = Some(data.created_at);
        }
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = UserOrdersState::default();
        Ok(())
    }
}

impl ReadModel for UserOrdersView {
    fn name(&self) -> &'static str {
        "UserOrdersView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.users.len()).unwrap_or(0)
    }
}

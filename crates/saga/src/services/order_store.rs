//! Order store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::{NewOrder, Order};
use tokio::sync::RwLock;

use crate::error::ServiceError;

/// Durable storage for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Validates and stores an order, returning its new ID.
    ///
    /// The order and its items are written atomically.
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, ServiceError>;

    /// Loads an order with its items.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, ServiceError>;

    /// Returns every order, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, ServiceError> {
        (**self).create_order(order).await
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, ServiceError> {
        (**self).get_order(order_id).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        (**self).list_orders().await
    }
}

#[derive(Default)]
struct StoreState {
    orders: RwLock<HashMap<OrderId, Order>>,
    create_calls: AtomicU64,
    latency_ms: AtomicU64,
    fail_on_create: AtomicBool,
}

/// In-memory order store.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<StoreState>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every create call fail.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.fail_on_create.store(fail, Ordering::SeqCst);
    }

    /// Adds artificial latency to create calls.
    pub fn set_latency(&self, latency: Duration) {
        self.state
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> u64 {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    pub async fn order_count(&self) -> usize {
        self.state.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, ServiceError> {
        self.state.create_calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.state.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.state.fail_on_create.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("order store is down".to_string()));
        }

        order.validate()?;

        let order_id = OrderId::new();
        self.state
            .orders
            .write()
            .await
            .insert(order_id, order.clone().into_order(order_id));
        Ok(order_id)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, ServiceError> {
        Ok(self.state.orders.read().await.get(&order_id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        let mut orders: Vec<Order> = self.state.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, UserId};
    use domain::{OrderItem, OrderStatus, ValidationError};

    fn new_order() -> NewOrder {
        NewOrder::new(
            UserId::new("user-1"),
            vec![OrderItem::new("SKU-001", 2, Money::from_cents(500))],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryOrderStore::new();
        let order_id = store.create_order(&new_order()).await.unwrap();

        let order = store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.id, order_id);
        assert_eq!(order.total_amount, Money::from_cents(1000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_order() {
        let store = InMemoryOrderStore::new();
        assert!(store.get_order(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_mismatched_total() {
        let store = InMemoryOrderStore::new();
        let mut order = new_order();
        order.total_amount = Money::from_cents(1);

        let result = store.create_order(&order).await;
        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::TotalMismatch { .. }))
        ));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_fail_on_create() {
        let store = InMemoryOrderStore::new();
        store.set_fail_on_create(true);

        assert!(store.create_order(&new_order()).await.is_err());
        assert_eq!(store.create_calls(), 1);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = InMemoryOrderStore::new();
        let first = store.create_order(&new_order()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = store.create_order(&new_order()).await.unwrap();

        let ids: Vec<_> = store
            .list_orders()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![second, first]);
    }
}

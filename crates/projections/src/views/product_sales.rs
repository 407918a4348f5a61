//! Product sales read model: units and revenue per product.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId};
use domain::{OrderCreatedEvent, OrderEvent};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::error::ProjectionError;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Sales totals for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub units_sold: u64,
    pub revenue: Money,
    /// Orders containing the product, counted once per order.
    pub order_count: u64,
    pub last_sold_at: Option<DateTime<Utc>>,
}

impl ProductSales {
    fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            units_sold: 0,
            revenue: Money::zero(),
            order_count: 0,
            last_sold_at: None,
        }
    }
}

#[derive(Default)]
struct SalesState {
    products: HashMap<ProductId, ProductSales>,
    seen_orders: HashSet<OrderId>,
    position: ProjectionPosition,
}

impl SalesState {
    /// Applies every line of the order or none of them.
    fn apply(&mut self, data: &OrderCreatedEvent) -> Result<()> {
        let overflow = || ProjectionError::Overflow(data.order_id);
        let mut staged: HashMap<&ProductId, ProductSales> = HashMap::new();
        for item in &data.items {
            let sales = staged.entry(&item.product_id).or_insert_with(|| {
                let mut sales = self
                    .products
                    .get(&item.product_id)
                    .cloned()
                    .unwrap_or_else(|| ProductSales::new(item.product_id.clone()));
                sales.order_count += 1;
                sales
            });
            sales.units_sold = sales
                .units_sold
                .checked_add(u64::from(item.quantity))
                .ok_or_else(overflow)?;
            sales.revenue = item
                .subtotal()
                .and_then(|subtotal| sales.revenue.checked_add(subtotal))
                .ok_or_else(overflow)?;
            if sales.last_sold_at.is_none_or(|at| at < data.created_at) {
                sales.last_sold_at = Some(data.created_at);
            }
        }
        for (product_id, sales) in staged {
            self.products.insert(product_id.clone(), sales);
        }
        Ok(())
    }
}

/// Read model of units sold and revenue per product.
///
/// Fed from `order.created` events. An order is applied at most once no
/// matter how often its event is delivered.
#[derive(Clone, Default)]
pub struct ProductSalesView {
    state: Arc<RwLock<SalesState>>,
}

impl ProductSalesView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_product(&self, product_id: &ProductId) -> Option<ProductSales> {
        self.state.read().await.products.get(product_id).cloned()
    }

    /// Returns every product, ordered by product ID.
    pub async fn get_all_products(&self) -> Vec<ProductSales> {
        let mut products: Vec<_> = self.state.read().await.products.values().cloned().collect();
        products.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        products
    }

    pub async fn top_by_units(&self, limit: usize) -> Vec<ProductSales> {
        let mut products = self.get_all_products().await;
        products.sort_by(|a, b| b.units_sold.cmp(&a.units_sold));
        products.truncate(limit);
        products
    }

    pub async fn top_by_revenue(&self, limit: usize) -> Vec<ProductSales> {
        let mut products = self.get_all_products().await;
        products.sort_by(|a, b| b.revenue.cmp(&a.revenue));
        products.truncate(limit);
        products
    }

    /// Revenue across all products, or `None` if the sum does not fit.
    pub async fn total_revenue(&self) -> Option<Money> {
        self.state
            .read()
            .await
            .products
            .values()
            .try_fold(Money::zero(), |total, p| total.checked_add(p.revenue))
    }

    /// Number of distinct orders applied.
    pub async fn orders_applied(&self) -> usize {
        self.state.read().await.seen_orders.len()
    }

    /// Number of redelivered events that were ignored.
    pub async fn duplicates_skipped(&self) -> u64 {
        self.state.read().await.position.duplicates
    }
}

#[async_trait]
impl Projection for ProductSalesView {
    fn name(&self) -> &'static str {
        "ProductSalesView"
    }

    async fn handle(&self, event: &OrderEvent) -> Result<()> {
        let mut state = self.state.write().await;

        match event {
            OrderEvent::OrderCreatedV1(data) => {
                if state.seen_orders.contains(&data.order_id) {
                    state.position = state.position.duplicate();
                    tracing::debug!(order_id = %data.order_id, "duplicate order event skipped");
                    return Ok(());
                }
                state.apply(data)?;
                state.seen_orders.insert(data.order_id);
                state.position = state.position.applied(data.order_id);
            }
        }
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = SalesState::default();
        Ok(())
    }
}

impl ReadModel for ProductSalesView {
    fn name(&self) -> &'static str {
        "ProductSalesView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.state.try_read().map(|s| s.products.len()).unwrap_or(0)
    }
}

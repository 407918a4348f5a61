//! PostgreSQL-backed collaborators.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use domain::{NewOrder, Order, OrderItem, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{CatalogReader, EventSink, OrderStore};
use crate::error::ServiceError;

/// Catalog backed by the read-only `products` table.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogReader for PostgresCatalog {
    async fn get_price(&self, product_id: &ProductId) -> Result<Option<Money>, ServiceError> {
        let cents: Option<i64> =
            sqlx::query_scalar("SELECT price_cents FROM products WHERE id = $1")
                .bind(product_id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(cents.map(Money::from_cents))
    }
}

/// Order store over the `orders` and `order_items` tables.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_header(row: &PgRow) -> Result<Order, ServiceError> {
        let status: String = row.try_get("status")?;
        let status = status.parse::<OrderStatus>().map_err(ServiceError::Corrupt)?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            items: Vec::new(),
            total_amount: Money::from_cents(row.try_get("total_cents")?),
            status,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<(Uuid, OrderItem), ServiceError> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| ServiceError::Corrupt(format!("negative quantity {quantity}")))?;
        let item = OrderItem::new(
            ProductId::new(row.try_get::<String, _>("product_id")?),
            quantity,
            Money::from_cents(row.try_get("unit_price_cents")?),
        );
        Ok((row.try_get("order_id")?, item))
    }

    async fn attach_items(&self, mut orders: Vec<Order>) -> Result<Vec<Order>, ServiceError> {
        if orders.is_empty() {
            return Ok(orders);
        }
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_no
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let (order_id, item) = Self::row_to_item(row)?;
            items.entry(order_id).or_default().push(item);
        }
        for order in &mut orders {
            order.items = items.remove(&order.id.as_uuid()).unwrap_or_default();
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(user_id = %order.user_id))]
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, ServiceError> {
        order.validate()?;

        let order_id = OrderId::new();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for (line_no, item) in order.items.iter().enumerate() {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                ServiceError::Corrupt(format!("quantity {} out of range", item.quantity))
            })?;
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, line_no, product_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(line_no as i32)
            .bind(item.product_id.as_str())
            .bind(quantity)
            .bind(item.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, ServiceError> {
        let row = sqlx::query(
            "SELECT id, user_id, total_cents, status, created_at FROM orders WHERE id = $1",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let header = Self::row_to_header(&row)?;
        Ok(self.attach_items(vec![header]).await?.pop())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ServiceError> {
        let rows = sqlx::query(
            "SELECT id, user_id, total_cents, status, created_at FROM orders ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let headers = rows
            .iter()
            .map(Self::row_to_header)
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_items(headers).await
    }
}

/// Event sink that appends to the `outbox` table for a relay to dispatch.
#[derive(Clone)]
pub struct PostgresOutboxSink {
    pool: PgPool,
}

impl PostgresOutboxSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the number of messages not yet dispatched.
    pub async fn pending_count(&self) -> Result<i64, ServiceError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM outbox WHERE dispatched_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl EventSink for PostgresOutboxSink {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ServiceError> {
        sqlx::query("INSERT INTO outbox (topic, payload) VALUES ($1, $2)")
            .bind(topic)
            .bind(payload)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

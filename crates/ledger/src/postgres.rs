use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::ledger::record_adjustment;
use crate::{InventoryLedger, InventoryRecord, LedgerError, ProductId, Result};

/// SQLSTATE `numeric_value_out_of_range`, raised when `quantity` would leave `BIGINT`.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// PostgreSQL-backed inventory ledger.
///
/// Each adjustment is a single conditional statement, so the row lock taken by
/// PostgreSQL serializes concurrent adjustments on the same product. The
/// `inventory_quantity_non_negative` check constraint backs the invariant at
/// the storage level.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<InventoryRecord> {
        Ok(InventoryRecord {
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            quantity: row.try_get("quantity")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn deduct_in_place(&self, product_id: &ProductId, delta: i64) -> Result<i64> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE inventory
            SET quantity = quantity + $2, updated_at = NOW()
            WHERE product_id = $1 AND quantity + $2 >= 0
            RETURNING quantity
            "#,
        )
        .bind(product_id.as_str())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(quantity) => Ok(quantity),
            None => {
                // Informational only; the rejection above is what is authoritative.
                let available = self.get_quantity(product_id).await?;
                Err(LedgerError::InsufficientStock {
                    product_id: product_id.clone(),
                    available,
                    requested: delta.unsigned_abs(),
                })
            }
        }
    }

    async fn upsert_restock(&self, product_id: &ProductId, delta: i64) -> Result<i64> {
        let quantity: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO inventory (product_id, quantity)
            VALUES ($1, $2)
            ON CONFLICT (product_id) DO UPDATE
            SET quantity = inventory.quantity + EXCLUDED.quantity, updated_at = NOW()
            RETURNING quantity
            "#,
        )
        .bind(product_id.as_str())
        .bind(delta)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db)
                if db.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) =>
            {
                LedgerError::Overflow(product_id.clone())
            }
            _ => LedgerError::from(err),
        })?;

        Ok(quantity)
    }
}

#[async_trait]
impl InventoryLedger for PostgresLedger {
    async fn get_quantity(&self, product_id: &ProductId) -> Result<i64> {
        let quantity: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM inventory WHERE product_id = $1")
                .bind(product_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(quantity.unwrap_or(0))
    }

    #[tracing::instrument(skip(self, product_id), fields(product_id = %product_id))]
    async fn adjust(&self, product_id: &ProductId, delta: i64) -> Result<i64> {
        let result = if delta < 0 {
            self.deduct_in_place(product_id, delta).await
        } else {
            self.upsert_restock(product_id, delta).await
        };
        record_adjustment(&result);

        if let Ok(quantity) = &result {
            tracing::debug!(delta, quantity = *quantity, "stock adjusted");
        }
        result
    }

    async fn get_record(&self, product_id: &ProductId) -> Result<Option<InventoryRecord>> {
        let row = sqlx::query(
            "SELECT product_id, quantity, updated_at FROM inventory WHERE product_id = $1",
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }
}

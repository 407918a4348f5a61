//! Record of deductions that compensation could not return.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CompensationFailed, ServiceError};

/// Why an entry needs an operator's attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationKind {
    /// The compensating restock failed. Stock is understated by `quantity`.
    CompensationFailed,

    /// The deduct timed out in flight and was not compensated. If it was
    /// applied, stock is understated by `quantity`.
    DeductOutcomeUnknown,

    /// The order write timed out after this line was reserved and the line
    /// was compensated. If the write landed, the order exists without its
    /// deduction.
    PersistOutcomeUnknown,
}

/// A deduction a failed order may have left behind.
///
/// `CompensationFailed` entries are certain; the other kinds record a step
/// whose outcome the orchestrator could not observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedDeduction {
    pub saga_id: Uuid,
    pub user_id: UserId,
    pub kind: ReconciliationKind,
    pub failure: CompensationFailed,
    pub recorded_at: DateTime<Utc>,
}

impl OrphanedDeduction {
    /// An entry for a compensating restock that could not be applied.
    pub fn new(saga_id: Uuid, user_id: UserId, failure: CompensationFailed) -> Self {
        Self::with_kind(saga_id, user_id, ReconciliationKind::CompensationFailed, failure)
    }

    pub fn with_kind(
        saga_id: Uuid,
        user_id: UserId,
        kind: ReconciliationKind,
        failure: CompensationFailed,
    ) -> Self {
        Self {
            saga_id,
            user_id,
            kind,
            failure,
            recorded_at: Utc::now(),
        }
    }

    /// Returns true when the deduction is known to be orphaned.
    pub fn is_confirmed(&self) -> bool {
        self.kind == ReconciliationKind::CompensationFailed
    }
}

/// Operator-facing sink for orphaned deductions.
#[async_trait]
pub trait ReconciliationLog: Send + Sync {
    async fn record(&self, entry: OrphanedDeduction) -> Result<(), ServiceError>;

    /// Returns every recorded entry, oldest first.
    async fn entries(&self) -> Result<Vec<OrphanedDeduction>, ServiceError>;
}

#[async_trait]
impl<T: ReconciliationLog + ?Sized> ReconciliationLog for Arc<T> {
    async fn record(&self, entry: OrphanedDeduction) -> Result<(), ServiceError> {
        (**self).record(entry).await
    }

    async fn entries(&self) -> Result<Vec<OrphanedDeduction>, ServiceError> {
        (**self).entries().await
    }
}

/// In-memory reconciliation log.
#[derive(Clone, Default)]
pub struct InMemoryReconciliationLog {
    entries: Arc<RwLock<Vec<OrphanedDeduction>>>,
}

impl InMemoryReconciliationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ReconciliationLog for InMemoryReconciliationLog {
    async fn record(&self, entry: OrphanedDeduction) -> Result<(), ServiceError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<OrphanedDeduction>, ServiceError> {
        Ok(self.entries.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    #[tokio::test]
    async fn test_record_and_list() {
        let log = InMemoryReconciliationLog::new();
        assert!(log.is_empty().await);

        let entry = OrphanedDeduction::new(
            Uuid::new_v4(),
            UserId::new("user-1"),
            CompensationFailed {
                product_id: ProductId::new("SKU-001"),
                quantity: 3,
                reason: "ledger is down".into(),
            },
        );
        log.record(entry.clone()).await.unwrap();

        assert_eq!(log.len().await, 1);
        assert_eq!(log.entries().await.unwrap(), vec![entry]);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let entry = OrphanedDeduction::with_kind(
            Uuid::new_v4(),
            UserId::new("user-1"),
            ReconciliationKind::DeductOutcomeUnknown,
            CompensationFailed {
                product_id: ProductId::new("SKU-001"),
                quantity: 1,
                reason: "deduct timed out".into(),
            },
        );
        assert!(!entry.is_confirmed());

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "deduct_outcome_unknown");
        assert_eq!(json["failure"]["quantity"], 1);
    }
}

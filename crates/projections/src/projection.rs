//! Core projection trait and delivery bookkeeping.

use async_trait::async_trait;
use common::OrderId;
use domain::OrderEvent;

use crate::Result;

/// How far a projection has consumed the order event stream.
///
/// Delivery is at-least-once, so `delivered` counts redeliveries too while
/// `duplicates` counts the ones that were ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    pub delivered: u64,
    pub duplicates: u64,
    /// Most recent order folded into the read model.
    pub last_order_id: Option<OrderId>,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Records an event that changed the read model.
    pub fn applied(self, order_id: OrderId) -> Self {
        Self {
            delivered: self.delivered + 1,
            last_order_id: Some(order_id),
            ..self
        }
    }

    /// Records a redelivered event that was ignored.
    pub fn duplicate(self) -> Self {
        Self {
            delivered: self.delivered + 1,
            duplicates: self.duplicates + 1,
            ..self
        }
    }

    /// Number of distinct orders applied.
    pub fn applied_count(&self) -> u64 {
        self.delivered - self.duplicates
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "position(delivered={}, duplicates={})",
            self.delivered, self.duplicates
        )
    }
}

/// A projection that applies order events to a read model.
///
/// Implementations must be idempotent: handling the same event twice leaves
/// the read model as if it had been handled once.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Folds one event into the read model.
    async fn handle(&self, event: &OrderEvent) -> Result<()>;

    async fn position(&self) -> ProjectionPosition;

    /// Clears the read model so it can be rebuilt from a replay.
    async fn reset(&self) -> Result<()>;
}

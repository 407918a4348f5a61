//! Per-attempt record of the stock deducted so far.

use common::ProductId;
use uuid::Uuid;

use crate::state::SagaState;

/// One deduction that the ledger accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The deductions applied during a single order creation attempt.
///
/// Lives only for the duration of the attempt and is never persisted. Lines
/// are kept in reservation order; compensation walks them in reverse.
#[derive(Debug, Clone)]
pub struct StockReservation {
    saga_id: Uuid,
    lines: Vec<ReservedLine>,
    state: SagaState,
}

impl StockReservation {
    /// Starts an empty reservation with a fresh correlation ID.
    pub fn new() -> Self {
        Self {
            saga_id: Uuid::new_v4(),
            lines: Vec::new(),
            state: SagaState::Reserving,
        }
    }

    /// Correlation ID used in logs and reconciliation records.
    pub fn saga_id(&self) -> Uuid {
        self.saga_id
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Returns lines in the order they were reserved.
    pub fn lines(&self) -> &[ReservedLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the lines in the order they must be compensated.
    pub fn compensation_order(&self) -> impl Iterator<Item = &ReservedLine> {
        self.lines.iter().rev()
    }

    /// Records a deduction the ledger has accepted.
    pub fn record(&mut self, product_id: ProductId, quantity: u32) {
        debug_assert!(self.state.can_reserve(), "record in {}", self.state);
        self.lines.push(ReservedLine {
            product_id,
            quantity,
        });
    }

    pub fn begin_persisting(&mut self) {
        debug_assert!(self.state.can_persist(), "persist in {}", self.state);
        self.state = SagaState::Persisting;
    }

    pub fn begin_compensation(&mut self) {
        debug_assert!(self.state.can_compensate(), "compensate in {}", self.state);
        self.state = SagaState::Compensating;
    }

    pub fn complete(&mut self) {
        debug_assert_eq!(self.state, SagaState::Persisting);
        self.state = SagaState::Completed;
    }

    pub fn fail(&mut self) {
        debug_assert_eq!(self.state, SagaState::Compensating);
        self.state = SagaState::Failed;
    }
}

impl Default for StockReservation {
    fn default() -> Self {
        Self::new()
    }
}

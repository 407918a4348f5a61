//! Saga state machine.

use serde::{Deserialize, Serialize};

/// Where an order creation attempt is in its lifecycle.
///
/// State transitions:
/// ```text
/// Reserving ──► Persisting ──► Completed
///     │              │
///     └──────────────┴──► Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Lines are being priced and deducted from the ledger.
    #[default]
    Reserving,

    /// Every line is reserved and the order is being written.
    Persisting,

    /// A step failed and deductions are being returned to the ledger.
    Compensating,

    /// The order is persisted (terminal state).
    Completed,

    /// Compensation finished after a failure (terminal state).
    Failed,
}

impl SagaState {
    /// Returns true if more lines may be reserved.
    pub fn can_reserve(&self) -> bool {
        matches!(self, SagaState::Reserving)
    }

    /// Returns true if the order may be handed to the store.
    pub fn can_persist(&self) -> bool {
        matches!(self, SagaState::Reserving)
    }

    /// Returns true if the saga can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaState::Reserving | SagaState::Persisting)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed | SagaState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Reserving => "Reserving",
            SagaState::Persisting => "Persisting",
            SagaState::Compensating => "Compensating",
            SagaState::Completed => "Completed",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_reserving() {
        assert_eq!(SagaState::default(), SagaState::Reserving);
    }

    #[test]
    fn test_can_compensate_before_terminal() {
        assert!(SagaState::Reserving.can_compensate());
        assert!(SagaState::Persisting.can_compensate());
        assert!(!SagaState::Compensating.can_compensate());
        assert!(!SagaState::Completed.can_compensate());
        assert!(!SagaState::Failed.can_compensate());
    }

    #[test]
    fn test_only_reserving_accepts_new_lines() {
        assert!(SagaState::Reserving.can_reserve());
        assert!(!SagaState::Persisting.can_reserve());
        assert!(!SagaState::Compensating.can_reserve());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SagaState::Reserving.is_terminal());
        assert!(!SagaState::Persisting.is_terminal());
        assert!(!SagaState::Compensating.is_terminal());
        assert!(SagaState::Completed.is_terminal());
        assert!(SagaState::Failed.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(SagaState::Persisting.to_string(), "Persisting");
        assert_eq!(SagaState::Compensating.to_string(), "Compensating");
    }
}

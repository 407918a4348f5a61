//! Order status machine.

use serde::{Deserialize, Serialize};

/// The status of an order.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Completed
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order is persisted; the surrounding workflow has not finished.
    #[default]
    Pending,

    /// Every step of order creation succeeded (terminal state).
    Completed,

    /// Order creation was abandoned (terminal state).
    Failed,
}

impl OrderStatus {
    /// Returns true if the order can move to `Completed`.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can move to `Failed`.
    pub fn can_fail(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Failed)
    }

    /// Returns the status as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

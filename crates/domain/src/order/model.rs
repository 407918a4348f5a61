//! Orders before and after persistence.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderItem, OrderStatus};
use crate::error::ValidationError;

/// An order that has been priced but not yet persisted.
///
/// Construction through [`NewOrder::new`] guarantees a non-empty item list and
/// a total equal to the sum of item subtotals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Builds a pending order and computes its total.
    pub fn new(user_id: UserId, items: Vec<OrderItem>) -> Result<Self, ValidationError> {
        let total_amount = subtotal_sum(&items)?;
        let order = Self {
            user_id,
            items,
            total_amount,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        order.validate()?;
        Ok(order)
    }

    /// Checks the invariants a store must enforce before persisting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_items(&self.items, self.total_amount)
    }

    /// Attaches the identifier assigned by the store.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            items: self.items,
            total_amount: self.total_amount,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Checks the non-empty and total invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_items(&self.items, self.total_amount)
    }

    /// Marks the order as fully settled.
    pub fn mark_completed(&mut self) -> Result<(), ValidationError> {
        self.transition(OrderStatus::Completed)
    }

    /// Marks the order as abandoned.
    pub fn mark_failed(&mut self) -> Result<(), ValidationError> {
        self.transition(OrderStatus::Failed)
    }

    fn transition(&mut self, to: OrderStatus) -> Result<(), ValidationError> {
        let allowed = match to {
            OrderStatus::Completed => self.status.can_complete(),
            OrderStatus::Failed => self.status.can_fail(),
            OrderStatus::Pending => false,
        };
        if !allowed {
            return Err(ValidationError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

fn subtotal_sum(items: &[OrderItem]) -> Result<Money, ValidationError> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        item.subtotal()
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or(ValidationError::TotalOverflow)
    })
}

fn validate_items(items: &[OrderItem], total: Money) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::NoItems);
    }
    for item in items {
        if item.quantity == 0 {
            return Err(ValidationError::InvalidQuantity {
                product_id: item.product_id.clone(),
            });
        }
        if item.unit_price.is_negative() {
            return Err(ValidationError::InvalidPrice {
                product_id: item.product_id.clone(),
                price: item.unit_price,
            });
        }
    }

    let expected = subtotal_sum(items)?;
    if expected != total {
        return Err(ValidationError::TotalMismatch {
            expected,
            actual: total,
        });
    }
    Ok(())
}

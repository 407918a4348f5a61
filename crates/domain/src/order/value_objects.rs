//! Value objects for the order domain.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A line of a submitted cart: what the caller wants, before pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// An item in an order, with the unit price frozen at reservation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit in cents.
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns `quantity * unit_price`, or None if it overflows.
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_item_subtotal() {
        let item = OrderItem::new("SKU-001", 3, Money::from_cents(1000));
        assert_eq!(item.subtotal(), Some(Money::from_cents(3000)));
    }

    #[test]
    fn test_order_item_subtotal_overflow() {
        let item = OrderItem::new("SKU-001", 2, Money::from_cents(i64::MAX));
        assert_eq!(item.subtotal(), None);
    }

    #[test]
    fn test_order_item_serialization() {
        let item = OrderItem::new("SKU-001", 2, Money::from_cents(999));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["product_id"], "SKU-001");
        assert_eq!(json["unit_price"], 999);
    }

    #[test]
    fn test_cart_item_from_str() {
        let item = CartItem::new("SKU-002", 4);
        assert_eq!(item.product_id.as_str(), "SKU-002");
        assert_eq!(item.quantity, 4);
    }
}

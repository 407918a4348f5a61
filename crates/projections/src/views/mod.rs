//! Read model views over order-created events.

pub mod product_sales;
pub mod user_orders;

pub use product_sales::{ProductSales, ProductSalesView};
pub use user_orders::{UserOrders, UserOrdersView};

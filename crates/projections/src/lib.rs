//! Read models fed by order-created events.
//!
//! This crate provides the consumer side of the order events:
//! - [`Projection`] trait for applying events to read models
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`EventProcessor`] for decoding sink messages and fanning them out
//! - Two idempotent views: product sales and user orders
//!
//! Events are delivered at least once. Every view deduplicates on the order
//! ID carried in the payload, so redelivery never double-counts.

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::EventProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{ProductSales, ProductSalesView, UserOrders, UserOrdersView};

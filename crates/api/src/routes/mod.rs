//! HTTP handlers grouped by resource.

pub mod admin;
pub mod inventory;
pub mod ops;
pub mod orders;

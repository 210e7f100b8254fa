//! Data models for dashboard resources.
//!
//! - `Memorial`, `MemorialEvent`: memorial pages and their services
//! - `Product`, `Order`, `Subscription`: store catalog and purchases
//! - `Profile`, `DashboardSummary`: account and overview counters
//! - `SectionData`: the decoded payload held by the resource cache

pub mod account;
pub mod commerce;
pub mod memorial;
pub mod payload;

pub use account::{DashboardSummary, Profile};
pub use commerce::{format_cents, Order, OrderItem, OrderStatus, Product, Subscription};
pub use memorial::{Memorial, MemorialEvent};
pub use payload::SectionData;

//! Orders domain module.
//!
//! Business rules for customer orders (no IO, no HTTP, no storage). The
//! restrict-on-delete rule between order items and products is enforced by
//! the storage backends in `storefront-infra`.

pub mod order;

pub use order::{Order, OrderItem, OrderStatus};

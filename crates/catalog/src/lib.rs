//! Catalog domain module: products and their reviews.
//!
//! This crate contains business rules for the catalog, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;
pub mod query;
pub mod review;

pub use product::{MAX_TITLE_LEN, Product, ProductChanges};
pub use query::{OrderingKey, ProductQuery, SortField};
pub use review::Review;

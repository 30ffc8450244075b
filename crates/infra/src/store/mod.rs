//! Storage layer: repository traits plus in-memory and Postgres backends.
//!
//! Both backends enforce the same referential rules:
//! - an order item pins its product (`RESTRICT` on product delete)
//! - deleting a product removes its reviews
//! - deleting an order removes its items

use async_trait::async_trait;
use thiserror::Error;

use storefront_catalog::{Product, Review};
use storefront_core::{OrderId, ProductId, ReviewId, UserId};
use storefront_orders::Order;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operation error.
///
/// `NotFound` and `IntegrityViolation` are expected outcomes that callers
/// surface to clients unchanged; `Backend` covers everything else (IO, pool,
/// corrupt rows).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("duplicate {0} id")]
    Duplicate(&'static str),

    #[error("storage backend error in {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(&self, product: Product) -> StoreResult<Product>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Product>;

    /// All products in storage order.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    async fn update_product(&self, product: Product) -> StoreResult<Product>;

    /// Fails with `IntegrityViolation` while any order item references the
    /// product; nothing is removed in that case.
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fails with `NotFound("product")` if the reviewed product does not exist.
    async fn insert_review(&self, review: Review) -> StoreResult<Review>;

    async fn get_review(&self, id: ReviewId) -> StoreResult<Review>;

    async fn list_reviews(&self) -> StoreResult<Vec<Review>>;

    /// Every review of `product_id` in storage order. Does not check that the
    /// product exists.
    async fn reviews_for_product(&self, product_id: ProductId) -> StoreResult<Vec<Review>>;

    async fn update_review(&self, review: Review) -> StoreResult<Review>;

    async fn delete_review(&self, id: ReviewId) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fails with `NotFound("product")` if any item names a missing product.
    async fn insert_order(&self, order: Order) -> StoreResult<Order>;

    async fn get_order(&self, id: OrderId) -> StoreResult<Order>;

    /// Orders placed by `owner`, or every order when `owner` is `None`.
    async fn list_orders(&self, owner: Option<UserId>) -> StoreResult<Vec<Order>>;

    /// Persist a status change. Items are immutable once placed.
    async fn update_order(&self, order: Order) -> StoreResult<Order>;

    async fn delete_order(&self, id: OrderId) -> StoreResult<()>;
}

/// Everything the API needs from a backend.
pub trait Storage: ProductStore + ReviewStore + OrderStore {}

impl<T> Storage for T where T: ProductStore + ReviewStore + OrderStore {}

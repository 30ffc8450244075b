//! Infrastructure adapters for the storefront: persistence backends.

pub mod store;

pub use store::{
    InMemoryStore, OrderStore, PostgresStore, ProductStore, ReviewStore, Storage, StoreError,
    StoreResult,
};

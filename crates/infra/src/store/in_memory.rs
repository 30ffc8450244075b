use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use storefront_catalog::{Product, Review};
use storefront_core::{Entity, OrderId, ProductId, ReviewId, UserId};
use storefront_orders::Order;

use super::{OrderStore, ProductStore, ReviewStore, StoreError, StoreResult};

/// Insertion-ordered table keyed by entity id.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: HashMap<E::Id, E>,
    order: Vec<E::Id>,
}

impl<E: Entity + Clone> Table<E> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn get(&self, id: &E::Id) -> Option<&E> {
        self.rows.get(id)
    }

    fn insert(&mut self, entity: E, what: &'static str) -> StoreResult<E> {
        let id = *entity.id();
        if self.rows.contains_key(&id) {
            return Err(StoreError::Duplicate(what));
        }
        self.order.push(id);
        self.rows.insert(id, entity.clone());
        Ok(entity)
    }

    fn replace(&mut self, entity: E, what: &'static str) -> StoreResult<E> {
        let slot = self
            .rows
            .get_mut(entity.id())
            .ok_or(StoreError::NotFound(what))?;
        *slot = entity.clone();
        Ok(entity)
    }

    fn remove(&mut self, id: &E::Id) -> Option<E> {
        let removed = self.rows.remove(id)?;
        self.order.retain(|k| k != id);
        Some(removed)
    }

    fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        let rows = &mut self.rows;
        self.order.retain(|id| {
            let kept = rows.get(id).is_some_and(|row| keep(row));
            if !kept {
                rows.remove(id);
            }
            kept
        });
    }

    fn iter(&self) -> impl Iterator<Item = &E> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }
}

#[derive(Debug)]
struct Tables {
    products: Table<Product>,
    reviews: Table<Review>,
    orders: Table<Order>,
}

/// In-memory store for tests/dev.
///
/// One lock guards all tables, so reference checks and the writes they guard
/// happen atomically.
#[derive(Debug)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables {
                products: Table::new(),
                reviews: Table::new(),
                orders: Table::new(),
            }),
        }
    }

    fn read(&self, operation: &'static str) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend(operation, "lock poisoned"))
    }

    fn write(&self, operation: &'static str) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend(operation, "lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        self.write("insert_product")?.products.insert(product, "product")
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        self.read("get_product")?
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("product"))
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read("list_products")?.products.iter().cloned().collect())
    }

    async fn update_product(&self, product: Product) -> StoreResult<Product> {
        self.write("update_product")?.products.replace(product, "product")
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut tables = self.write("delete_product")?;
        if tables.products.get(&id).is_none() {
            return Err(StoreError::NotFound("product"));
        }

        let referencing = tables
            .orders
            .iter()
            .filter(|order| order.references_product(id))
            .count();
        if referencing > 0 {
            return Err(StoreError::IntegrityViolation(format!(
                "product {id} is referenced by {referencing} order(s)"
            )));
        }

        tables.reviews.retain(|review| review.product_id() != id);
        tables.products.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert_review(&self, review: Review) -> StoreResult<Review> {
        let mut tables = self.write("insert_review")?;
        if tables.products.get(&review.product_id()).is_none() {
            return Err(StoreError::NotFound("product"));
        }
        tables.reviews.insert(review, "review")
    }

    async fn get_review(&self, id: ReviewId) -> StoreResult<Review> {
        self.read("get_review")?
            .reviews
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("review"))
    }

    async fn list_reviews(&self) -> StoreResult<Vec<Review>> {
        Ok(self.read("list_reviews")?.reviews.iter().cloned().collect())
    }

    async fn reviews_for_product(&self, product_id: ProductId) -> StoreResult<Vec<Review>> {
        Ok(self
            .read("reviews_for_product")?
            .reviews
            .iter()
            .filter(|review| review.product_id() == product_id)
            .cloned()
            .collect())
    }

    async fn update_review(&self, review: Review) -> StoreResult<Review> {
        self.write("update_review")?.reviews.replace(review, "review")
    }

    async fn delete_review(&self, id: ReviewId) -> StoreResult<()> {
        self.write("delete_review")?
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("review"))
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: Order) -> StoreResult<Order> {
        let mut tables = self.write("insert_order")?;
        let missing = order
            .items()
            .iter()
            .any(|item| tables.products.get(&item.product_id).is_none());
        if missing {
            return Err(StoreError::NotFound("product"));
        }
        tables.orders.insert(order, "order")
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        self.read("get_order")?
            .orders
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("order"))
    }

    async fn list_orders(&self, owner: Option<UserId>) -> StoreResult<Vec<Order>> {
        Ok(self
            .read("list_orders")?
            .orders
            .iter()
            .filter(|order| owner.is_none_or(|o| order.owner_id() == o))
            .cloned()
            .collect())
    }

    async fn update_order(&self, order: Order) -> StoreResult<Order> {
        let mut tables = self.write("update_order")?;
        let current = tables
            .orders
            .get(order.id())
            .ok_or(StoreError::NotFound("order"))?;
        // Items are fixed at placement; only the status is persisted.
        let next = current.with_status(order.status());
        tables.orders.replace(next, "order")
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        self.write("delete_order")?
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("order"))
    }
}

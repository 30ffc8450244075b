//! Application services: authorize, then call into storage.
//!
//! Handlers stay thin; every rule that decides *whether* something happens
//! lives here or in the domain crates.

use core::str::FromStr;
use std::sync::Arc;

use storefront_auth::{AccessDenied, Action, Caller, Resource};
use storefront_catalog::{Product, ProductChanges, ProductQuery, Review};
use storefront_core::{DomainError, OrderId, ProductId, ReviewId};
use storefront_infra::{InMemoryStore, PostgresStore, Storage, StoreResult};
use storefront_orders::{Order, OrderItem, OrderStatus};

use crate::app::errors::ApiResult;
use crate::authz::{authorize_request, require_identity};

/// Pick the backend: Postgres when a URL is configured, in-memory otherwise.
pub async fn connect_storage(database_url: Option<&str>) -> StoreResult<Arc<dyn Storage>> {
    match database_url {
        Some(url) => {
            let store = PostgresStore::connect(url).await?;
            store.ensure_schema().await?;
            tracing::info!("using postgres storage");
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory storage");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Parse an identifier from the path or the body.
///
/// Called only after the caller passed the access policy, so a malformed id
/// never turns a 401/403 into a 400.
fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.trim().parse()?)
}

pub struct AppServices {
    storage: Arc<dyn Storage>,
}

impl AppServices {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    // -------------------------
    // Products
    // -------------------------

    pub async fn list_products(&self, caller: &Caller, query: &ProductQuery) -> ApiResult<Vec<Product>> {
        authorize_request(caller, Resource::Product, Action::List, None)?;
        let products = self.storage.list_products().await?;
        Ok(query.apply(products))
    }

    /// A product together with its reviews.
    pub async fn get_product(&self, caller: &Caller, id: &str) -> ApiResult<(Product, Vec<Review>)> {
        authorize_request(caller, Resource::Product, Action::Retrieve, None)?;
        let id: ProductId = parse_id(id)?;
        let product = self.storage.get_product(id).await?;
        let reviews = self.storage.reviews_for_product(id).await?;
        Ok((product, reviews))
    }

    pub async fn create_product(
        &self,
        caller: &Caller,
        title: String,
        description: String,
        price: i64,
    ) -> ApiResult<Product> {
        authorize_request(caller, Resource::Product, Action::Create, None)?;
        let product = Product::create(ProductId::new(), title, description, price)?;
        let product = self.storage.insert_product(product).await?;
        tracing::info!(product_id = %product.id_typed(), "product created");
        Ok(product)
    }

    /// `action` is [`Action::Update`] for full replacement and
    /// [`Action::PartialUpdate`] for a patch.
    pub async fn update_product(
        &self,
        caller: &Caller,
        action: Action,
        id: &str,
        changes: ProductChanges,
    ) -> ApiResult<Product> {
        authorize_request(caller, Resource::Product, action, None)?;
        let id: ProductId = parse_id(id)?;
        let current = self.storage.get_product(id).await?;
        let next = current.with_changes(changes)?;
        let product = self.storage.update_product(next).await?;
        tracing::info!(product_id = %id, "product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, caller: &Caller, id: &str) -> ApiResult<()> {
        authorize_request(caller, Resource::Product, Action::Destroy, None)?;
        let id: ProductId = parse_id(id)?;
        self.storage
            .delete_product(id)
            .await
            .inspect_err(|err| tracing::info!(product_id = %id, error = %err, "product delete refused"))?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Every review of one product, oldest first.
    ///
    /// A missing product is reported as not found rather than as an empty
    /// list.
    pub async fn product_reviews(&self, caller: &Caller, id: &str) -> ApiResult<Vec<Review>> {
        authorize_request(caller, Resource::Product, Action::Reviews, None)?;
        let id: ProductId = parse_id(id)?;
        self.storage.get_product(id).await?;
        Ok(self.storage.reviews_for_product(id).await?)
    }

    // -------------------------
    // Reviews
    // -------------------------

    pub async fn list_reviews(&self, caller: &Caller) -> ApiResult<Vec<Review>> {
        authorize_request(caller, Resource::Review, Action::List, None)?;
        Ok(self.storage.list_reviews().await?)
    }

    pub async fn get_review(&self, caller: &Caller, id: &str) -> ApiResult<Review> {
        authorize_request(caller, Resource::Review, Action::Retrieve, None)?;
        let id: ReviewId = parse_id(id)?;
        Ok(self.storage.get_review(id).await?)
    }

    /// The caller becomes the author; any author supplied by the client is
    /// ignored.
    pub async fn create_review(
        &self,
        caller: &Caller,
        product_id: &str,
        content: String,
    ) -> ApiResult<Review> {
        authorize_request(caller, Resource::Review, Action::Create, None)?;
        let author = caller.user_id().ok_or(AccessDenied::Unauthenticated {
            resource: Resource::Review,
            action: Action::Create,
        })?;
        let product_id: ProductId = parse_id(product_id)?;
        let review = Review::create(ReviewId::new(), product_id, author, content)?;
        let review = self.storage.insert_review(review).await?;
        tracing::info!(review_id = %review.id_typed(), product_id = %product_id, user_id = %author, "review created");
        Ok(review)
    }

    /// `content: None` (an empty patch) leaves the review unchanged.
    pub async fn update_review(
        &self,
        caller: &Caller,
        action: Action,
        id: &str,
        content: Option<String>,
    ) -> ApiResult<Review> {
        let review = self.load_review_for(caller, action, id).await?;
        let id = review.id_typed();
        let Some(content) = content else {
            return Ok(review);
        };
        let next = review.with_content(content)?;
        let review = self.storage.update_review(next).await?;
        tracing::info!(review_id = %id, "review updated");
        Ok(review)
    }

    pub async fn delete_review(&self, caller: &Caller, id: &str) -> ApiResult<()> {
        let id = self.load_review_for(caller, Action::Destroy, id).await?.id_typed();
        self.storage.delete_review(id).await?;
        tracing::info!(review_id = %id, "review deleted");
        Ok(())
    }

    async fn load_review_for(&self, caller: &Caller, action: Action, id: &str) -> ApiResult<Review> {
        require_identity(caller, Resource::Review, action)?;
        let id: ReviewId = parse_id(id)?;
        let review = self.storage.get_review(id).await?;
        authorize_request(caller, Resource::Review, action, Some(review.author_id()))?;
        Ok(review)
    }

    // -------------------------
    // Orders
    // -------------------------

    /// Administrators see every order; everyone else sees their own.
    pub async fn list_orders(&self, caller: &Caller) -> ApiResult<Vec<Order>> {
        authorize_request(caller, Resource::Order, Action::List, None)?;
        let owner = if caller.is_admin() { None } else { caller.user_id() };
        Ok(self.storage.list_orders(owner).await?)
    }

    /// Someone else's order is reported as not found.
    pub async fn get_order(&self, caller: &Caller, id: &str) -> ApiResult<Order> {
        authorize_request(caller, Resource::Order, Action::Retrieve, None)?;
        let id: OrderId = parse_id(id)?;
        let order = self.storage.get_order(id).await?;
        if !caller.is_admin() && caller.user_id() != Some(order.owner_id()) {
            return Err(DomainError::not_found("order").into());
        }
        Ok(order)
    }

    /// `lines` pairs a raw product id with a quantity.
    pub async fn create_order(&self, caller: &Caller, lines: &[(&str, i64)]) -> ApiResult<Order> {
        authorize_request(caller, Resource::Order, Action::Create, None)?;
        let owner = caller.user_id().ok_or(AccessDenied::Unauthenticated {
            resource: Resource::Order,
            action: Action::Create,
        })?;
        let items = lines
            .iter()
            .map(|&(product_id, quantity)| -> ApiResult<OrderItem> {
                Ok(OrderItem::new(parse_id(product_id)?, quantity)?)
            })
            .collect::<ApiResult<Vec<_>>>()?;
        let order = Order::place(OrderId::new(), owner, items)?;
        let order = self.storage.insert_order(order).await?;
        tracing::info!(order_id = %order.id_typed(), user_id = %owner, items = order.items().len(), "order placed");
        Ok(order)
    }

    pub async fn update_order_status(&self, caller: &Caller, id: &str, status: &str) -> ApiResult<Order> {
        authorize_request(caller, Resource::Order, Action::PartialUpdate, None)?;
        let id: OrderId = parse_id(id)?;
        let status: OrderStatus = status.parse()?;
        let current = self.storage.get_order(id).await?;
        let order = self.storage.update_order(current.with_status(status)).await?;
        tracing::info!(order_id = %id, %status, "order status changed");
        Ok(order)
    }

    pub async fn delete_order(&self, caller: &Caller, id: &str) -> ApiResult<()> {
        authorize_request(caller, Resource::Order, Action::Destroy, None)?;
        let id: OrderId = parse_id(id)?;
        self.storage.delete_order(id).await?;
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }
}

//! Postgres-backed store.
//!
//! Referential rules live in the schema (see [`SCHEMA`]): `order_items.product_id`
//! is `ON DELETE RESTRICT`, so deleting an ordered product fails inside
//! Postgres and nothing is removed.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (foreign key violation) | `23503` | `IntegrityViolation` (`NotFound("product")` on insert) |
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | anything else | - | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use storefront_catalog::{Product, Review};
use storefront_core::{OrderId, OrderItemId, ProductId, ReviewId, UserId};
use storefront_orders::{Order, OrderItem, OrderStatus};

use super::{OrderStore, ProductStore, ReviewStore, StoreError, StoreResult};

/// Tables and constraints, applied in order by [`PostgresStore::ensure_schema`].
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          UUID PRIMARY KEY,
        title       VARCHAR(100) NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        price       BIGINT NOT NULL CHECK (price >= 0),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id         UUID PRIMARY KEY,
        product_id UUID NOT NULL REFERENCES products (id) ON DELETE CASCADE,
        author_id  UUID NOT NULL,
        content    TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reviews_product_id ON reviews (product_id)",
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id         UUID PRIMARY KEY,
        owner_id   UUID NOT NULL,
        status     VARCHAR(20) NOT NULL DEFAULT 'open'
                   CHECK (status IN ('open', 'in_progress', 'cancelled', 'finished')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id         UUID PRIMARY KEY,
        order_id   UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        product_id UUID NOT NULL REFERENCES products (id) ON DELETE RESTRICT,
        quantity   BIGINT NOT NULL CHECK (quantity > 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items (order_id)",
];

/// Postgres-backed store.
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create missing tables and indexes. Idempotent.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn items_for(&self, order_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, OrderItem)>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(order_ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_order_items", e))?;

        rows.iter()
            .map(|row| {
                let order_id: Uuid = get(row, "order_id", "load_order_items")?;
                Ok((order_id, item_from_row(row)?))
            })
            .collect()
    }

    async fn orders_with_items(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Order>> {
        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| get(row, "id", "load_orders"))
            .collect::<StoreResult<_>>()?;
        let mut items = self.items_for(&ids).await?;

        rows.iter()
            .map(|row| {
                let id: Uuid = get(row, "id", "load_orders")?;
                let owner: Uuid = get(row, "owner_id", "load_orders")?;
                let status: String = get(row, "status", "load_orders")?;
                let status: OrderStatus = status
                    .parse()
                    .map_err(|e| StoreError::backend("load_orders", format!("{e}")))?;

                let (mine, rest): (Vec<_>, Vec<_>) =
                    items.drain(..).partition(|(order_id, _)| *order_id == id);
                items = rest;

                Ok(Order::restore(
                    OrderId::from_uuid(id),
                    UserId::from_uuid(owner),
                    status,
                    mine.into_iter().map(|(_, item)| item).collect(),
                ))
            })
            .collect()
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip_all, fields(product_id = %product.id_typed()), err)]
    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        sqlx::query("INSERT INTO products (id, title, description, price) VALUES ($1, $2, $3, $4)")
            .bind(product.id_typed().as_uuid())
            .bind(product.title())
            .bind(product.description())
            .bind(price_to_db(product.price())?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let row = sqlx::query("SELECT id, title, description, price FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?
            .ok_or(StoreError::NotFound("product"))?;
        product_from_row(&row)
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, title, description, price FROM products ORDER BY created_at, id",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip_all, fields(product_id = %product.id_typed()), err)]
    async fn update_product(&self, product: Product) -> StoreResult<Product> {
        let result =
            sqlx::query("UPDATE products SET title = $2, description = $3, price = $4 WHERE id = $1")
                .bind(product.id_typed().as_uuid())
                .bind(product.title())
                .bind(product.description())
                .bind(price_to_db(product.price())?)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_product", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("product"));
        }
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("product"));
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for PostgresStore {
    #[instrument(skip_all, fields(review_id = %review.id_typed()), err)]
    async fn insert_review(&self, review: Review) -> StoreResult<Review> {
        sqlx::query("INSERT INTO reviews (id, product_id, author_id, content) VALUES ($1, $2, $3, $4)")
            .bind(review.id_typed().as_uuid())
            .bind(review.product_id().as_uuid())
            .bind(review.author_id().as_uuid())
            .bind(review.content())
            .execute(&*self.pool)
            .await
            .map_err(|e| missing_product(map_sqlx_error("insert_review", e)))?;
        Ok(review)
    }

    async fn get_review(&self, id: ReviewId) -> StoreResult<Review> {
        let row = sqlx::query("SELECT id, product_id, author_id, content FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_review", e))?
            .ok_or(StoreError::NotFound("review"))?;
        review_from_row(&row)
    }

    async fn list_reviews(&self) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query(
            "SELECT id, product_id, author_id, content FROM reviews ORDER BY created_at, id",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_reviews", e))?;
        rows.iter().map(review_from_row).collect()
    }

    async fn reviews_for_product(&self, product_id: ProductId) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, author_id, content
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reviews_for_product", e))?;
        rows.iter().map(review_from_row).collect()
    }

    async fn update_review(&self, review: Review) -> StoreResult<Review> {
        let result = sqlx::query("UPDATE reviews SET content = $2 WHERE id = $1")
            .bind(review.id_typed().as_uuid())
            .bind(review.content())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_review", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("review"));
        }
        Ok(review)
    }

    async fn delete_review(&self, id: ReviewId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_review", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("review"));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip_all, fields(order_id = %order.id_typed(), items = order.items().len()), err)]
    async fn insert_order(&self, order: Order) -> StoreResult<Order> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("INSERT INTO orders (id, owner_id, status) VALUES ($1, $2, $3)")
            .bind(order.id_typed().as_uuid())
            .bind(order.owner_id().as_uuid())
            .bind(order.status().as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;

        for item in order.items() {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity) VALUES ($1, $2, $3, $4)",
            )
            .bind(item.id.as_uuid())
            .bind(order.id_typed().as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await
            .map_err(|e| missing_product(map_sqlx_error("insert_order_item", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        let row = sqlx::query("SELECT id, owner_id, status FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?
            .ok_or(StoreError::NotFound("order"))?;
        let mut orders = self.orders_with_items(vec![row]).await?;
        orders.pop().ok_or(StoreError::NotFound("order"))
    }

    async fn list_orders(&self, owner: Option<UserId>) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, status
            FROM orders
            WHERE $1::uuid IS NULL OR owner_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(owner.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;
        self.orders_with_items(rows).await
    }

    #[instrument(skip_all, fields(order_id = %order.id_typed(), status = %order.status()), err)]
    async fn update_order(&self, order: Order) -> StoreResult<Order> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order.id_typed().as_uuid())
            .bind(order.status().as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("order"));
        }
        self.get_order(order.id_typed()).await
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("order"));
        }
        Ok(())
    }
}

fn get<'r, T>(row: &'r PgRow, column: &'static str, operation: &'static str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::backend(operation, format!("column {column}: {e}")))
}

fn price_to_db(price: u64) -> StoreResult<i64> {
    i64::try_from(price).map_err(|_| StoreError::backend("encode_price", "price out of range"))
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let price: i64 = get(row, "price", "decode_product")?;
    Ok(Product::restore(
        ProductId::from_uuid(get(row, "id", "decode_product")?),
        get(row, "title", "decode_product")?,
        get(row, "description", "decode_product")?,
        u64::try_from(price).map_err(|_| StoreError::backend("decode_product", "negative price"))?,
    ))
}

fn review_from_row(row: &PgRow) -> StoreResult<Review> {
    Ok(Review::restore(
        ReviewId::from_uuid(get(row, "id", "decode_review")?),
        ProductId::from_uuid(get(row, "product_id", "decode_review")?),
        UserId::from_uuid(get(row, "author_id", "decode_review")?),
        get(row, "content", "decode_review")?,
    ))
}

fn item_from_row(row: &PgRow) -> StoreResult<OrderItem> {
    let quantity: i64 = get(row, "quantity", "decode_order_item")?;
    Ok(OrderItem {
        id: OrderItemId::from_uuid(get(row, "id", "decode_order_item")?),
        product_id: ProductId::from_uuid(get(row, "product_id", "decode_order_item")?),
        quantity: u32::try_from(quantity)
            .map_err(|_| StoreError::backend("decode_order_item", "quantity out of range"))?,
    })
}

/// On inserts a foreign key failure means the referenced product is missing.
fn missing_product(err: StoreError) -> StoreError {
    match err {
        StoreError::IntegrityViolation(_) => StoreError::NotFound("product"),
        other => other,
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{} ({})", db_err.message(), operation);
            match db_err.code().as_deref() {
                Some("23503") => StoreError::IntegrityViolation(msg),
                Some("23505") => StoreError::Duplicate(operation),
                _ => StoreError::backend(operation, msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::backend(operation, "connection pool closed"),
        other => StoreError::backend(operation, other.to_string()),
    }
}

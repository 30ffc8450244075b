use serde::{Deserialize, Serialize};

use storefront_catalog::{Product, ProductChanges, ProductQuery, Review};
use storefront_core::{OrderId, OrderItemId, ProductId, ReviewId, UserId};
use storefront_orders::{Order, OrderItem, OrderStatus};

// -------------------------
// Request DTOs
// -------------------------

/// Query string accepted by `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub price_from: Option<u64>,
    pub price_to: Option<u64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl From<ProductListParams> for ProductQuery {
    fn from(params: ProductListParams) -> Self {
        ProductQuery {
            price_from: params.price_from,
            price_to: params.price_to,
            search: params.search,
            ordering: params
                .ordering
                .as_deref()
                .map(ProductQuery::parse_ordering)
                .unwrap_or_default(),
        }
    }
}

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Deserialize)]
pub struct WriteProductRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
}

impl From<WriteProductRequest> for ProductChanges {
    fn from(body: WriteProductRequest) -> Self {
        ProductChanges {
            title: Some(body.title),
            description: Some(body.description),
            price: Some(body.price),
        }
    }
}

/// Body of `PATCH /products/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct PatchProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
}

impl From<PatchProductRequest> for ProductChanges {
    fn from(body: PatchProductRequest) -> Self {
        ProductChanges {
            title: body.title,
            description: body.description,
            price: body.price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchReviewRequest {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: String,
}

// -------------------------
// Response DTOs
// -------------------------

/// Product as shown in listings.
#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub price: u64,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id_typed(),
            title: p.title().to_string(),
            price: p.price(),
        }
    }
}

/// Product as shown on its own page, reviews included.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: u64,
    pub reviews: Vec<ReviewResponse>,
}

impl ProductDetail {
    pub fn new(product: &Product, reviews: &[Review]) -> Self {
        Self {
            id: product.id_typed(),
            title: product.title().to_string(),
            description: product.description().to_string(),
            price: product.price(),
            reviews: reviews.iter().map(ReviewResponse::from).collect(),
        }
    }
}

/// Product as returned from writes (no embedded reviews).
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: u64,
}

impl From<&Product> for ProductResponse {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id_typed(),
            title: p.title().to_string(),
            description: p.description().to_string(),
            price: p.price(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author_id: UserId,
    pub content: String,
}

impl From<&Review> for ReviewResponse {
    fn from(r: &Review) -> Self {
        Self {
            id: r.id_typed(),
            product_id: r.product_id(),
            author_id: r.author_id(),
            content: r.content().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub owner_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id_typed(),
            owner_id: order.owner_id(),
            status: order.status(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_params_build_a_catalog_query() {
        let query = ProductQuery::from(ProductListParams {
            price_from: Some(10),
            ordering: Some("-price,bogus".into()),
            ..ProductListParams::default()
        });
        assert_eq!(query.price_from, Some(10));
        assert_eq!(query.ordering.len(), 1);
        assert!(query.ordering[0].descending);
    }

    #[test]
    fn summary_hides_description() {
        let product = Product::create(ProductId::new(), "Mug", "Holds tea", 800).unwrap();
        let value = serde_json::to_value(ProductSummary::from(&product)).unwrap();
        assert_eq!(
            value,
            json!({ "id": product.id_typed().to_string(), "title": "Mug", "price": 800 })
        );
    }

    #[test]
    fn order_status_is_rendered_snake_case() {
        let item = OrderItem::new(ProductId::new(), 1).unwrap();
        let order = Order::place(OrderId::new(), UserId::new(), vec![item])
            .unwrap()
            .with_status(OrderStatus::InProgress);
        let value = serde_json::to_value(OrderResponse::from(&order)).unwrap();
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["items"][0]["quantity"], 1);
    }
}

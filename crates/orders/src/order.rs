use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, OrderId, OrderItemId, ProductId, UserId};

/// Order status lifecycle.
///
/// Exactly these four values are accepted; anything else fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Open,
    InProgress,
    Cancelled,
    Finished,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Open,
        OrderStatus::InProgress,
        OrderStatus::Cancelled,
        OrderStatus::Finished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Finished => "finished",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "status must be one of: open, in_progress, cancelled, finished (got '{s}')"
                ))
            })
    }
}

/// Order line: product and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(product_id: ProductId, quantity: i64) -> DomainResult<Self> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| DomainError::validation("quantity must be positive"))?;
        Ok(Self {
            id: OrderItemId::new(),
            product_id,
            quantity,
        })
    }
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    owner_id: UserId,
    status: OrderStatus,
    items: Vec<OrderItem>,
}

impl Order {
    /// Place a new order. Orders start `open` and must carry at least one item.
    pub fn place(id: OrderId, owner_id: UserId, items: Vec<OrderItem>) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }
        Ok(Self {
            id,
            owner_id,
            status: OrderStatus::default(),
            items,
        })
    }

    /// Rebuild an order from trusted storage without re-validating.
    pub fn restore(id: OrderId, owner_id: UserId, status: OrderStatus, items: Vec<OrderItem>) -> Self {
        Self {
            id,
            owner_id,
            status,
            items,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn references_product(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }

    pub fn with_status(&self, status: OrderStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, ProductId};

/// Longest accepted product title, in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    title: String,
    description: String,
    /// Price in smallest currency unit (e.g., cents).
    price: u64,
}

/// Field changes for an existing product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
}

impl Product {
    /// Validate and build a new product.
    pub fn create(
        id: ProductId,
        title: impl Into<String>,
        description: impl Into<String>,
        price: i64,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            title: validate_title(title.into())?,
            description: description.into(),
            price: validate_price(price)?,
        })
    }

    /// Rebuild a product from trusted storage without re-validating.
    pub fn restore(id: ProductId, title: String, description: String, price: u64) -> Self {
        Self {
            id,
            title,
            description,
            price,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    /// Return a copy with `changes` applied; the original is left untouched if
    /// any field is rejected.
    pub fn with_changes(&self, changes: ProductChanges) -> DomainResult<Self> {
        let mut next = self.clone();
        if let Some(title) = changes.title {
            next.title = validate_title(title)?;
        }
        if let Some(description) = changes.description {
            next.description = description;
        }
        if let Some(price) = changes.price {
            next.price = validate_price(price)?;
        }
        Ok(next)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_title(title: String) -> DomainResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("title cannot be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::validation(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_price(price: i64) -> DomainResult<u64> {
    u64::try_from(price).map_err(|_| DomainError::validation("price cannot be negative"))
}

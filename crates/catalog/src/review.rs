use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, ProductId, ReviewId, UserId};

/// A user's review of one product.
///
/// The product and author are fixed at creation; only the content changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    id: ReviewId,
    product_id: ProductId,
    author_id: UserId,
    content: String,
}

impl Review {
    pub fn create(
        id: ReviewId,
        product_id: ProductId,
        author_id: UserId,
        content: impl Into<String>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            product_id,
            author_id,
            content: validate_content(content.into())?,
        })
    }

    /// Rebuild a review from trusted storage without re-validating.
    pub fn restore(id: ReviewId, product_id: ProductId, author_id: UserId, content: String) -> Self {
        Self {
            id,
            product_id,
            author_id,
            content,
        }
    }

    pub fn id_typed(&self) -> ReviewId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn with_content(&self, content: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            content: validate_content(content.into())?,
            ..self.clone()
        })
    }
}

impl Entity for Review {
    type Id = ReviewId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_content(content: String) -> DomainResult<String> {
    if content.trim().is_empty() {
        return Err(DomainError::validation("review content cannot be empty"));
    }
    Ok(content)
}

//! Product listing query: price range filter, text search and ordering.
//!
//! Evaluated in memory over whatever the storage layer returns, so every
//! backend lists products the same way.

use std::cmp::Ordering;

use crate::Product;

/// Sortable product fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortField {
    Title,
    Price,
}

/// One ordering key, e.g. `-price`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrderingKey {
    pub field: SortField,
    pub descending: bool,
}

impl OrderingKey {
    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ord = match self.field {
            SortField::Title => a.title().cmp(b.title()),
            SortField::Price => a.price().cmp(&b.price()),
        };
        if self.descending { ord.reverse() } else { ord }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Inclusive lower price bound.
    pub price_from: Option<u64>,
    /// Inclusive upper price bound.
    pub price_to: Option<u64>,
    /// Terms split on whitespace and commas. Every term must appear,
    /// case-insensitively, in the title or the description.
    pub search: Option<String>,
    /// Applied left to right; empty keeps storage order.
    pub ordering: Vec<OrderingKey>,
}

impl ProductQuery {
    /// Parse a comma separated ordering parameter (`title,-price`).
    ///
    /// Unknown fields are ignored.
    pub fn parse_ordering(raw: &str) -> Vec<OrderingKey> {
        raw.split(',')
            .map(str::trim)
            .filter_map(|term| {
                let (descending, name) = match term.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, term),
                };
                let field = match name {
                    "title" => SortField::Title,
                    "price" => SortField::Price,
                    _ => return None,
                };
                Some(OrderingKey { field, descending })
            })
            .collect()
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.price_from.is_some_and(|from| product.price() < from) {
            return false;
        }
        if self.price_to.is_some_and(|to| product.price() > to) {
            return false;
        }
        let Some(search) = self.search.as_deref() else {
            return true;
        };
        let title = product.title().to_lowercase();
        let description = product.description().to_lowercase();
        search_terms(search).all(|term| title.contains(&term) || description.contains(&term))
    }

    /// Filter then sort. The sort is stable, so ties keep storage order.
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut out: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        if !self.ordering.is_empty() {
            out.sort_by(|a, b| {
                self.ordering
                    .iter()
                    .map(|key| key.compare(a, b))
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }
        out
    }
}

fn search_terms(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
}

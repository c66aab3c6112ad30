//! Catalog provider: the fixed product list the storefront sells from.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use validator::Validate;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::Price;

const SEED_PRODUCTS: &str = include_str!("../data/products.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("product {id} failed validation: {source}")]
    Invalid { id: String, source: validator::ValidationErrors },
    #[error("duplicate product id {0}")]
    DuplicateId(String),
}

/// Immutable, ordered product list.
#[derive(Clone, Debug)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// The storefront's built-in product list.
    pub fn seeded() -> Result<Self, CatalogError> { Self::from_json(SEED_PRODUCTS) }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for p in &products {
            p.validate().map_err(|source| CatalogError::Invalid { id: p.id().to_string(), source })?;
            if !seen.insert(p.id()) { return Err(CatalogError::DuplicateId(p.id().to_string())); }
        }
        debug!(count = products.len(), "catalog loaded");
        Ok(Self { products })
    }

    pub fn products(&self) -> &[Product] { &self.products }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }

    pub fn get_by_id(&self, id: &str) -> Option<&Product> { self.products.iter().find(|p| p.id() == id) }

    /// Products matching every constraint in `filter`, in catalog order.
    pub fn filter(&self, filter: &CatalogFilter) -> Vec<&Product> {
        self.products.iter().filter(|p| filter.matches(p)).collect()
    }

    /// Filter choices offered alongside the product grid.
    pub fn facets(&self) -> CatalogFacets {
        let categories: BTreeSet<_> = self.products.iter().map(|p| p.category().to_string()).collect();
        let sizes: BTreeSet<_> = self.products.iter().flat_map(|p| p.sizes().iter().cloned()).collect();
        let colors: BTreeSet<_> = self.products.iter().flat_map(|p| p.colors().iter().cloned()).collect();
        CatalogFacets {
            categories: categories.into_iter().collect(),
            sizes: sizes.into_iter().collect(),
            colors: colors.into_iter().collect(),
            min_price: self.products.iter().map(Product::price).min().unwrap_or(Price::ZERO),
            max_price: self.products.iter().map(Product::price).max().unwrap_or(Price::ZERO),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFacets {
    pub categories: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub min_price: Price,
    pub max_price: Price,
}

/// Product query. An empty set or a missing range leaves that axis open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub categories: BTreeSet<String>,
    pub sizes: BTreeSet<String>,
    pub colors: BTreeSet<String>,
    /// Inclusive on both ends.
    pub price_range: Option<(Price, Price)>,
}

impl CatalogFilter {
    pub fn new() -> Self { Self::default() }

    /// The "cleared" state of the filter sidebar: every axis open, price
    /// bounds spanning the whole catalog.
    pub fn spanning(facets: &CatalogFacets) -> Self {
        Self { price_range: Some((facets.min_price, facets.max_price)), ..Self::default() }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self { self.categories.insert(category.into()); self }
    pub fn size(mut self, size: impl Into<String>) -> Self { self.sizes.insert(size.into()); self }
    pub fn color(mut self, color: impl Into<String>) -> Self { self.colors.insert(color.into()); self }
    pub fn price_range(mut self, min: Price, max: Price) -> Self { self.price_range = Some((min, max)); self }

    pub fn matches(&self, product: &Product) -> bool {
        let in_category = self.categories.is_empty() || self.categories.contains(product.category());
        let in_sizes = self.sizes.is_empty() || product.sizes().iter().any(|s| self.sizes.contains(s));
        let in_colors = self.colors.is_empty() || product.colors().iter().any(|c| self.colors.contains(c));
        let in_price = self.price_range.map_or(true, |(min, max)| product.price() >= min && product.price() <= max);
        in_category && in_sizes && in_colors && in_price
    }
}

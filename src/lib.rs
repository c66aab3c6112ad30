//! Luxe Storefront
//!
//! Cart state manager and catalog provider behind the storefront views.
//!
//! ## Features
//! - Cart store with line consolidation, clamped quantities and derived totals
//! - Cart persistence to a named storage slot, attached as a listener
//! - Static product catalog with category/size/color/price filtering
//! - JSON HTTP surface for the views that consume both

pub mod catalog;
pub mod config;
pub mod domain;
pub mod http;
pub mod storage;
pub mod store;

use thiserror::Error;

pub use catalog::{Catalog, CatalogFacets, CatalogFilter};
pub use domain::aggregates::{Cart, CartLineItem, LineKey, Product, Selection};
pub use domain::value_objects::{Price, Quantity};
pub use store::{CartListener, CartPersistence, CartSnapshot, CartStore, DEFAULT_CART_SLOT};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error(transparent)]
    Catalog(#[from] catalog::CatalogError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Storage(#[from] storage::StorageError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

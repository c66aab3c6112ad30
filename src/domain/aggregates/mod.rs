//! Aggregates module
pub mod product;
pub mod cart;

pub use product::{Product, ReviewSummary, Selection};
pub use cart::{Cart, CartLineItem, LineKey};

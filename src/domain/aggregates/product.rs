//! Product Aggregate

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::aggregates::cart::CartLineItem;
use crate::domain::value_objects::{Price, Quantity};

/// A catalog record. Loaded once and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_pricing"))]
pub struct Product {
    #[validate(length(min = 1))]
    id: String,
    #[validate(length(min = 1))]
    name: String,
    price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_price: Option<Price>,
    images: Vec<String>,
    #[validate(length(min = 1))]
    category: String,
    description: String,
    #[validate(length(min = 1))]
    sizes: Vec<String>,
    #[validate(length(min = 1))]
    colors: Vec<String>,
    #[serde(default)]
    features: Vec<String>,
    #[validate]
    reviews: ReviewSummary,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ReviewSummary {
    #[validate(range(min = 0.0, max = 5.0))]
    pub average: f64,
    pub count: u32,
}

impl ReviewSummary {
    /// Number of filled stars shown next to the rating.
    pub fn whole_stars(&self) -> u8 { self.average.floor().clamp(0.0, 5.0) as u8 }
}

/// Size and color picked on a product page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub size: Option<String>,
    pub color: Option<String>,
}

fn validate_pricing(product: &Product) -> Result<(), ValidationError> {
    match product.original_price {
        Some(original) if original <= product.price => Err(ValidationError::new("original_price_not_above_price")),
        _ => Ok(()),
    }
}

impl Product {
    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn price(&self) -> Price { self.price }
    pub fn original_price(&self) -> Option<Price> { self.original_price }
    pub fn images(&self) -> &[String] { &self.images }
    pub fn category(&self) -> &str { &self.category }
    pub fn description(&self) -> &str { &self.description }
    pub fn sizes(&self) -> &[String] { &self.sizes }
    pub fn colors(&self) -> &[String] { &self.colors }
    pub fn features(&self) -> &[String] { &self.features }
    pub fn reviews(&self) -> &ReviewSummary { &self.reviews }

    pub fn offers_size(&self, size: &str) -> bool { self.sizes.iter().any(|s| s == size) }
    pub fn offers_color(&self, color: &str) -> bool { self.colors.iter().any(|c| c == color) }

    /// Whole-percent markdown from the original price, rounded half away from zero.
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?.amount();
        if original.is_zero() { return None; }
        let pct = (original - self.price.amount()) / original * Decimal::ONE_HUNDRED;
        pct.round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero).to_u32()
    }

    /// Builds the candidate line an "add to cart" action hands to the store.
    /// Returns `None` when the selection names a size or color the product
    /// does not come in.
    pub fn to_line_item(&self, selection: Selection, quantity: Quantity) -> Option<CartLineItem> {
        if selection.size.as_deref().is_some_and(|s| !self.offers_size(s)) { return None; }
        if selection.color.as_deref().is_some_and(|c| !self.offers_color(c)) { return None; }
        Some(CartLineItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            unit_price: self.price,
            image: self.images.first().cloned().unwrap_or_default(),
            category: Some(self.category.clone()),
            size: selection.size,
            color: selection.color,
            quantity,
        })
    }
}

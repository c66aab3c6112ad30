//! Cart Aggregate

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::events::{CartEvent, CartEventKind};
use crate::domain::value_objects::{Price, Quantity};

/// Identity of a cart line: two lines with the same product but a different
/// size or color are distinct. An empty size or color is the same as none.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl LineKey {
    pub fn new(product_id: impl Into<String>, size: Option<String>, color: Option<String>) -> Self {
        Self { product_id: product_id.into(), size: non_blank(size), color: non_blank(color) }
    }
}

fn non_blank(v: Option<String>) -> Option<String> { v.filter(|s| !s.is_empty()) }

/// One persisted cart entry. Field names follow the storage slot schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    #[serde(rename = "id")]
    pub product_id: String,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Price,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub quantity: Quantity,
}

impl CartLineItem {
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.size.clone(), self.color.clone())
    }

    fn has_key(&self, key: &LineKey) -> bool {
        fn blank(v: &Option<String>) -> Option<&str> { v.as_deref().filter(|s| !s.is_empty()) }
        self.product_id == key.product_id && blank(&self.size) == key.size.as_deref() && blank(&self.color) == key.color.as_deref()
    }

    pub fn line_total(&self) -> Price { self.unit_price.times(self.quantity) }
}

/// Cart state. Totals are computed from the lines on every read.
///
/// Every operation records a [`CartEvent`]; they accumulate until drained
/// with [`Cart::take_events`]. [`crate::store::CartStore`] drains after each
/// operation, so a `Cart` used on its own must be drained by its owner.
#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartLineItem>,
    events: Vec<CartEvent>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a cart from previously persisted lines. Lines sharing a key
    /// are consolidated into the first occurrence.
    pub fn restore(lines: Vec<CartLineItem>) -> Self {
        let mut cart = Self::new();
        for line in lines { cart.insert_or_merge(line); }
        cart
    }

    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn line_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn find(&self, key: &LineKey) -> Option<&CartLineItem> { self.items.iter().find(|i| i.has_key(key)) }

    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity.value())).sum()
    }

    pub fn subtotal(&self) -> Price { self.items.iter().map(CartLineItem::line_total).sum() }

    /// Adds a line, or grows the quantity of the line already holding the key.
    /// A merged line keeps its original display fields.
    pub fn add_item(&mut self, item: CartLineItem) {
        let key = item.key();
        let added = item.quantity;
        let kind = match self.insert_or_merge(item) {
            Some(quantity) => CartEventKind::ItemMerged { key, added, quantity },
            None => CartEventKind::ItemAdded { key, quantity: added },
        };
        debug!(?kind, "cart add");
        self.raise_event(kind);
    }

    pub fn remove_item(&mut self, key: &LineKey) {
        let before = self.items.len();
        self.items.retain(|i| !i.has_key(key));
        let removed = self.items.len() != before;
        debug!(?key, removed, "cart remove");
        self.raise_event(CartEventKind::ItemRemoved { key: key.clone(), removed });
    }

    /// Sets the quantity of an existing line, clamped to at least one.
    /// Removal is never a side effect of this operation.
    pub fn update_quantity(&mut self, key: &LineKey, requested: i64) {
        let quantity = self.items.iter_mut().find(|i| i.has_key(key)).map(|item| {
            item.quantity = Quantity::clamped(requested);
            item.quantity
        });
        debug!(?key, requested, ?quantity, "cart update quantity");
        self.raise_event(CartEventKind::QuantityUpdated { key: key.clone(), quantity });
    }

    pub fn clear(&mut self) {
        let removed_lines = self.items.len();
        self.items.clear();
        debug!(removed_lines, "cart cleared");
        self.raise_event(CartEventKind::Cleared { removed_lines });
    }

    /// Removes and returns the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<CartEvent> { std::mem::take(&mut self.events) }

    fn insert_or_merge(&mut self, item: CartLineItem) -> Option<Quantity> {
        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.has_key(&key)) {
            existing.quantity = existing.quantity.add(item.quantity);
            Some(existing.quantity)
        } else {
            self.items.push(item);
            None
        }
    }

    fn raise_event(&mut self, kind: CartEventKind) { self.events.push(CartEvent::now(kind)); }
}

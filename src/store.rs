//! The cart store: one explicitly constructed owner of the cart, the
//! operations consumers call, and synchronous change notification.
//!
//! Persistence is not baked into the mutations. It is a [`CartListener`]
//! ([`CartPersistence`]) attached at start-up, so the state transitions can be
//! exercised without any storage at all.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::aggregates::{Cart, CartLineItem, LineKey};
use crate::domain::events::CartEvent;
use crate::domain::value_objects::Price;
use crate::storage::{KeyValueStore, StorageError};

/// Storage slot the storefront keeps its cart under.
pub const DEFAULT_CART_SLOT: &str = "luxe_cart_v1";

/// Observer of cart mutations. Called synchronously, once per event, after
/// the state change has been applied.
pub trait CartListener: Send + Sync {
    fn on_cart_event(&self, event: &CartEvent, cart: &Cart);
}

impl<F> CartListener for F
where
    F: Fn(&CartEvent, &Cart) + Send + Sync,
{
    fn on_cart_event(&self, event: &CartEvent, cart: &Cart) { self(event, cart) }
}

/// Handle returned by [`CartStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Point-in-time view of the cart with its derived totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartLineItem>,
    pub total_quantity: u64,
    pub subtotal: Price,
}

impl From<&Cart> for CartSnapshot {
    fn from(cart: &Cart) -> Self {
        Self { items: cart.items().to_vec(), total_quantity: cart.total_quantity(), subtotal: cart.subtotal() }
    }
}

#[derive(Default)]
pub struct CartStore {
    cart: Cart,
    listeners: Vec<(SubscriptionId, Arc<dyn CartListener>)>,
    next_subscription: u64,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore").field("cart", &self.cart).field("listeners", &self.listeners.len()).finish()
    }
}

impl CartStore {
    pub fn new() -> Self { Self::default() }

    /// Starts from whatever the slot holds. A missing or unreadable slot
    /// yields an empty cart.
    pub fn restore(storage: &dyn KeyValueStore, slot: &str) -> Self {
        let cart = Cart::restore(CartPersistence::load(storage, slot));
        debug!(slot, lines = cart.line_count(), "cart restored");
        Self { cart, ..Self::default() }
    }

    pub fn subscribe(&mut self, listener: impl CartListener + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns false if the handle was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn items(&self) -> &[CartLineItem] { self.cart.items() }
    pub fn total_quantity(&self) -> u64 { self.cart.total_quantity() }
    pub fn subtotal(&self) -> Price { self.cart.subtotal() }
    pub fn snapshot(&self) -> CartSnapshot { CartSnapshot::from(&self.cart) }

    pub fn add_item(&mut self, item: CartLineItem) {
        self.cart.add_item(item);
        self.publish();
    }

    pub fn remove_item(&mut self, product_id: &str, size: Option<&str>, color: Option<&str>) {
        self.cart.remove_item(&line_key(product_id, size, color));
        self.publish();
    }

    pub fn update_quantity(&mut self, product_id: &str, size: Option<&str>, color: Option<&str>, quantity: i64) {
        self.cart.update_quantity(&line_key(product_id, size, color), quantity);
        self.publish();
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.publish();
    }

    /// Drains the cart's events, so they never pile up behind the store.
    fn publish(&mut self) {
        for event in self.cart.take_events() {
            for (_, listener) in &self.listeners {
                listener.on_cart_event(&event, &self.cart);
            }
        }
    }
}

fn line_key(product_id: &str, size: Option<&str>, color: Option<&str>) -> LineKey {
    LineKey::new(product_id, size.map(str::to_string), color.map(str::to_string))
}

/// Writes the whole line list to one storage slot after every cart event.
/// Failures are logged and swallowed; the in-memory cart stays authoritative.
#[derive(Debug, Clone)]
pub struct CartPersistence {
    storage: Arc<dyn KeyValueStore>,
    slot: String,
}

impl CartPersistence {
    pub fn new(storage: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Self {
        Self { storage, slot: slot.into() }
    }

    pub fn slot(&self) -> &str { &self.slot }

    pub fn save(&self, items: &[CartLineItem]) -> Result<(), PersistError> {
        let json = serde_json::to_string(items)?;
        self.storage.set(&self.slot, &json)?;
        Ok(())
    }

    /// Reads the slot, falling back to an empty list on any failure.
    pub fn load(storage: &dyn KeyValueStore, slot: &str) -> Vec<CartLineItem> {
        match Self::try_load(storage, slot) {
            Ok(Some(items)) => items,
            Ok(None) => {
                debug!(slot, "no persisted cart");
                Vec::new()
            }
            Err(e) => {
                warn!(slot, error = %e, "discarding unreadable persisted cart");
                Vec::new()
            }
        }
    }

    fn try_load(storage: &dyn KeyValueStore, slot: &str) -> Result<Option<Vec<CartLineItem>>, PersistError> {
        let Some(raw) = storage.get(slot)? else { return Ok(None) };
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

impl CartListener for CartPersistence {
    fn on_cart_event(&self, _event: &CartEvent, cart: &Cart) {
        if let Err(e) = self.save(cart.items()) {
            warn!(slot = %self.slot, error = %e, "failed to persist cart");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("cart JSON: {0}")]
    Json(#[from] serde_json::Error),
}

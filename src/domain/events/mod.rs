//! Domain events
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::aggregates::LineKey;
use crate::domain::value_objects::Quantity;

/// Something that happened to a cart, recorded by the aggregate and
/// dispatched to subscribers by the store.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartEvent {
    pub kind: CartEventKind,
    pub occurred_at: DateTime<Utc>,
}

impl CartEvent {
    pub fn now(kind: CartEventKind) -> Self { Self { kind, occurred_at: Utc::now() } }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEventKind {
    /// A new line was appended.
    ItemAdded { key: LineKey, quantity: Quantity },
    /// An existing line absorbed more units.
    ItemMerged { key: LineKey, added: Quantity, quantity: Quantity },
    /// `removed` is false when no line had the key.
    ItemRemoved { key: LineKey, removed: bool },
    /// `quantity` is `None` when no line had the key.
    QuantityUpdated { key: LineKey, quantity: Option<Quantity> },
    Cleared { removed_lines: usize },
}

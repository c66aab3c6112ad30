//! Domain layer: cart and product aggregates, value objects and cart events.
pub mod aggregates;
pub mod events;
pub mod value_objects;

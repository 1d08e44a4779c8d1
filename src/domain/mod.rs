//! Domain model: cart, catalog entries and coupons
pub mod aggregates;
pub mod value_objects;

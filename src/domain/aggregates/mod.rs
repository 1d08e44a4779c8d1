//! Aggregates module
pub mod cart;
pub mod coupon;
pub mod product;

pub use cart::{Cart, CartEntry, CartError, CartLine, CartSettings};
pub use coupon::Coupon;
pub use product::{
    Category, CategoryTranslation, CreatedFilter, NewCategory, NewProduct, Product, ProductEdit,
    ProductFilter, ProductTranslation,
};

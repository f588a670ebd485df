//! Entity model: the product record and its validation.

mod product;

pub use product::{NewProduct, Product, ProductFields, ProductId};

mod attribute;
mod document;
mod review;
mod sku;

pub use attribute::{Attribute, Brand, Image};
pub use document::{Product, ProductBuilder, CATEGORY_SEPARATOR};
pub use review::CustomerReview;
pub use sku::Sku;

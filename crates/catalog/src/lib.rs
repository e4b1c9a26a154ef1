//! `storefront-catalog` — products, brands and categories.

pub mod brand;
pub mod category;
pub mod product;

pub use brand::Brand;
pub use category::Category;
pub use product::{Product, SpecMap};

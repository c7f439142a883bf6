pub mod aggregate;

pub use aggregate::{
    deepest_category_path, Product, ProductCategory, ProductId, ProductView, GTIN_META_KEYS,
};

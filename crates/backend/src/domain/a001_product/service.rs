use anyhow::Result;
use contracts::domain::a001_product::{Product, ProductCategory};

use super::{categories, repository};

/// Meta keys checked when matching an incoming order line's barcode
/// against the catalog. Narrower than the feed-side list: these are the
/// keys stores actually fill for lookup purposes.
pub const ORDER_MATCH_META_KEYS: [&str; 7] = [
    "_gtin",
    "_ean",
    "_upc",
    "_global_unique_id",
    "gtin",
    "ean",
    "upc",
];

/// Published products together with the category tree, the working set
/// for feed generation.
pub async fn load_catalog() -> Result<(Vec<Product>, Vec<ProductCategory>)> {
    let products = repository::list_published().await?;
    let categories = categories::list_all().await?;
    Ok((products, categories))
}

pub async fn count_products() -> Result<u64> {
    repository::count().await
}

/// Replace-or-insert a catalog snapshot, products and category terms
/// alike. Returns (products, categories) written.
pub async fn import_catalog(
    products: &[Product],
    categories: &[ProductCategory],
) -> Result<(usize, usize)> {
    for category in categories {
        categories::upsert(category).await?;
    }
    for product in products {
        repository::upsert(product).await?;
    }
    Ok((products.len(), categories.len()))
}

/// Match an order line's barcode to a catalog product: exact SKU first,
/// then the common GTIN meta keys, in order.
pub fn resolve_by_gtin<'a>(products: &'a [Product], gtin: &str) -> Option<&'a Product> {
    let gtin = gtin.trim();
    if gtin.is_empty() {
        return None;
    }

    if let Some(found) = products.iter().find(|p| p.sku == gtin) {
        return Some(found);
    }

    for key in ORDER_MATCH_META_KEYS {
        if let Some(found) = products
            .iter()
            .find(|p| p.meta.get(key).map(|v| v.trim()) == Some(gtin))
        {
            return Some(found);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_product::ProductId;
    use std::collections::BTreeMap;

    fn product(id: i64, sku: &str) -> Product {
        Product {
            id: ProductId(id),
            parent_id: None,
            sku: sku.to_string(),
            name: format!("Product {id}"),
            description: String::new(),
            regular_price: Some(10.0),
            sale_price: None,
            stock_quantity: Some(1),
            in_stock: true,
            length: None,
            width: None,
            height: None,
            weight: None,
            images: vec![],
            category_ids: vec![],
            meta: BTreeMap::new(),
            attributes: BTreeMap::new(),
            published: true,
            updated_at: None,
        }
    }

    #[test]
    fn sku_match_wins_over_meta() {
        let mut by_meta = product(1, "OTHER");
        by_meta.meta.insert("_ean".into(), "4006381333931".into());
        let by_sku = product(2, "4006381333931");

        let products = vec![by_meta, by_sku];
        let found = resolve_by_gtin(&products, "4006381333931").unwrap();
        assert_eq!(found.id.value(), 2);
    }

    #[test]
    fn meta_keys_checked_in_order() {
        let mut later_key = product(1, "A");
        later_key.meta.insert("ean".into(), "9783161484100".into());
        let mut earlier_key = product(2, "B");
        earlier_key.meta.insert("_gtin".into(), "9783161484100".into());

        let products = vec![later_key, earlier_key];
        let found = resolve_by_gtin(&products, "9783161484100").unwrap();
        assert_eq!(found.id.value(), 2);
    }

    #[test]
    fn unknown_or_empty_gtin_matches_nothing() {
        let products = vec![product(1, "ABC")];
        assert!(resolve_by_gtin(&products, "4006381333931").is_none());
        assert!(resolve_by_gtin(&products, "").is_none());
        assert!(resolve_by_gtin(&products, "   ").is_none());
    }
}

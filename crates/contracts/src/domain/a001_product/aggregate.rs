use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-side product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl ProductId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Meta keys probed for a GTIN, in priority order. Covers the common
/// store plugins that each stash the barcode under their own key.
pub const GTIN_META_KEYS: [&str; 13] = [
    "_gtin",
    "gtin",
    "_ean",
    "ean",
    "_isbn",
    "isbn",
    "_upc",
    "upc",
    "_barcode",
    "barcode",
    "_global_unique_id",
    "_wpm_gtin_code",
    "hwp_product_gtin",
];

/// Catalog product as mirrored from the source store. Variations are
/// separate products pointing at their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub parent_id: Option<ProductId>,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub regular_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub stock_quantity: Option<i64>,
    pub in_stock: bool,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub images: Vec<String>,
    pub category_ids: Vec<i64>,
    pub meta: BTreeMap<String, String>,
    /// Display attributes (size, colour and the like), keyed by
    /// attribute slug.
    pub attributes: BTreeMap<String, String>,
    pub published: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// First non-empty meta value among `keys`, in the order given.
    pub fn meta_first(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.meta.get(*k))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    /// Resolve the product's GTIN: meta keys first, then the SKU itself
    /// when it is a plausible barcode (all digits, at least 8 of them).
    pub fn gtin(&self) -> Option<String> {
        if let Some(found) = self.meta_first(&GTIN_META_KEYS) {
            return Some(found.to_string());
        }
        let sku = self.sku.trim();
        if sku.len() >= 8 && sku.chars().all(|c| c.is_ascii_digit()) {
            return Some(sku.to_string());
        }
        None
    }

    /// Sale price when set, otherwise the regular price.
    pub fn effective_price(&self) -> Option<f64> {
        self.sale_price.or(self.regular_price)
    }

    /// First non-empty attribute among `names`, in the order given.
    pub fn attribute_first(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|n| self.attributes.get(*n))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}

/// Product category node from the store taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
}

/// Full path from the root to `category_id`, segments joined with " > ".
/// Returns None when the id is unknown. Cycles are cut off defensively.
fn category_path(categories: &[ProductCategory], category_id: i64) -> Option<String> {
    let by_id: BTreeMap<i64, &ProductCategory> =
        categories.iter().map(|c| (c.id, c)).collect();
    let mut segments = Vec::new();
    let mut current = Some(category_id);
    while let Some(id) = current {
        let cat = by_id.get(&id)?;
        segments.push(cat.name.clone());
        current = cat.parent_id;
        if segments.len() > categories.len() {
            return None;
        }
    }
    segments.reverse();
    Some(segments.join(" > "))
}

/// Among the categories a product is assigned to, pick the deepest one
/// and render its full path. Ties resolve to the first assigned id.
pub fn deepest_category_path(
    categories: &[ProductCategory],
    assigned_ids: &[i64],
) -> Option<String> {
    let mut best: Option<String> = None;
    let mut best_depth = 0usize;
    for id in assigned_ids {
        if let Some(path) = category_path(categories, *id) {
            let depth = path.matches(" > ").count() + 1;
            if depth > best_depth {
                best_depth = depth;
                best = Some(path);
            }
        }
    }
    best
}

/// A product together with its optional parent. Variation rows often
/// carry only the fields that differ, the rest falls back to the parent.
#[derive(Debug, Clone, Copy)]
pub struct ProductView<'a> {
    pub product: &'a Product,
    pub parent: Option<&'a Product>,
}

impl<'a> ProductView<'a> {
    pub fn new(product: &'a Product, parent: Option<&'a Product>) -> Self {
        Self { product, parent }
    }

    fn fallback<T, F>(&self, pick: F) -> Option<T>
    where
        F: Fn(&'a Product) -> Option<T>,
    {
        pick(self.product).or_else(|| self.parent.and_then(&pick))
    }

    pub fn description(&self) -> &'a str {
        if !self.product.description.trim().is_empty() {
            return &self.product.description;
        }
        match self.parent {
            Some(p) => &p.description,
            None => &self.product.description,
        }
    }

    pub fn meta_first(&self, keys: &[&str]) -> Option<&'a str> {
        self.product
            .meta_first(keys)
            .or_else(|| self.parent.and_then(|p| p.meta_first(keys)))
    }

    pub fn gtin(&self) -> Option<String> {
        self.product.gtin().or_else(|| self.parent.and_then(|p| p.gtin()))
    }

    pub fn length(&self) -> Option<f64> {
        self.fallback(|p| p.length)
    }

    pub fn width(&self) -> Option<f64> {
        self.fallback(|p| p.width)
    }

    pub fn height(&self) -> Option<f64> {
        self.fallback(|p| p.height)
    }

    pub fn weight(&self) -> Option<f64> {
        self.fallback(|p| p.weight)
    }

    pub fn images(&self) -> &'a [String] {
        if !self.product.images.is_empty() {
            return &self.product.images;
        }
        match self.parent {
            Some(p) => &p.images,
            None => &self.product.images,
        }
    }

    pub fn category_ids(&self) -> &'a [i64] {
        if !self.product.category_ids.is_empty() {
            return &self.product.category_ids;
        }
        match self.parent {
            Some(p) => &p.category_ids,
            None => &self.product.category_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64) -> Product {
        Product {
            id: ProductId(id),
            parent_id: None,
            sku: String::new(),
            name: format!("Product {id}"),
            description: String::new(),
            regular_price: None,
            sale_price: None,
            stock_quantity: None,
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
    fn meta_keys_probed_in_order() {
        let mut p = product(1);
        p.meta.insert("ean".into(), "4006381333931".into());
        p.meta.insert("_gtin".into(), "4006381333930".into());
        // _gtin wins even though ean is also present
        assert_eq!(p.gtin().as_deref(), Some("4006381333930"));
    }

    #[test]
    fn empty_meta_values_are_skipped() {
        let mut p = product(1);
        p.meta.insert("_gtin".into(), "   ".into());
        p.meta.insert("ean".into(), "9783161484100".into());
        assert_eq!(p.gtin().as_deref(), Some("9783161484100"));
    }

    #[test]
    fn numeric_sku_acts_as_gtin_fallback() {
        let mut p = product(1);
        p.sku = "40063813".into();
        assert_eq!(p.gtin().as_deref(), Some("40063813"));

        p.sku = "4006381".into(); // 7 digits, too short
        assert_eq!(p.gtin(), None);

        p.sku = "ABC12345678".into(); // not purely numeric
        assert_eq!(p.gtin(), None);
    }

    #[test]
    fn effective_price_prefers_sale() {
        let mut p = product(1);
        p.regular_price = Some(19.99);
        assert_eq!(p.effective_price(), Some(19.99));
        p.sale_price = Some(14.99);
        assert_eq!(p.effective_price(), Some(14.99));
    }

    #[test]
    fn deepest_path_wins() {
        let cats = vec![
            ProductCategory { id: 1, parent_id: None, name: "Books".into() },
            ProductCategory { id: 2, parent_id: Some(1), name: "Fiction".into() },
            ProductCategory { id: 3, parent_id: Some(2), name: "Crime".into() },
            ProductCategory { id: 4, parent_id: None, name: "Sale".into() },
        ];
        assert_eq!(
            deepest_category_path(&cats, &[4, 3]).as_deref(),
            Some("Books > Fiction > Crime")
        );
        assert_eq!(deepest_category_path(&cats, &[4]).as_deref(), Some("Sale"));
        assert_eq!(deepest_category_path(&cats, &[99]), None);
        assert_eq!(deepest_category_path(&cats, &[]), None);
    }

    #[test]
    fn category_cycle_does_not_hang() {
        let cats = vec![
            ProductCategory { id: 1, parent_id: Some(2), name: "A".into() },
            ProductCategory { id: 2, parent_id: Some(1), name: "B".into() },
        ];
        assert_eq!(deepest_category_path(&cats, &[1]), None);
    }

    #[test]
    fn view_falls_back_to_parent() {
        let mut parent = product(1);
        parent.description = "Parent description".into();
        parent.weight = Some(0.5);
        parent.images = vec!["https://img/parent.jpg".into()];
        parent.meta.insert("_gtin".into(), "4006381333930".into());

        let mut variation = product(2);
        variation.parent_id = Some(ProductId(1));
        variation.weight = Some(0.6);

        let view = ProductView::new(&variation, Some(&parent));
        assert_eq!(view.weight(), Some(0.6));
        assert_eq!(view.description(), "Parent description");
        assert_eq!(view.images(), parent.images.as_slice());
        assert_eq!(view.gtin().as_deref(), Some("4006381333930"));

        let lone = ProductView::new(&variation, None);
        assert_eq!(lone.gtin(), None);
        assert_eq!(lone.description(), "");
    }
}

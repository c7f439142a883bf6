use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use contracts::domain::a001_product::{deepest_category_path, Product, ProductCategory, ProductView};
use contracts::enums::{DimensionUnit, WeightUnit};
use contracts::usecases::u101_product_feed_sync::{FeedResult, SkippedProduct};

use crate::shared::config::FeedConfig;
use crate::shared::format::{format_amount, round2};

/// Column layout of the marketplace product feed. Order matters.
pub const FEED_COLUMNS: [&str; 37] = [
    "gtin",
    "title",
    "country",
    "condition",
    "price",
    "tax",
    "currency",
    "delivery_time_days",
    "stock",
    "return_days",
    "main_image_url",
    "brand",
    "category",
    "google_category",
    "seller_category",
    "description",
    "length_mm",
    "width_mm",
    "height_mm",
    "weight_g",
    "shipping_length_mm",
    "shipping_width_mm",
    "shipping_height_mm",
    "shipping_weight_g",
    "volume_ml",
    "size",
    "colour",
    "image_2_url",
    "image_3_url",
    "image_4_url",
    "image_5_url",
    "delete_product",
    "author",
    "language",
    "format",
    "year",
    "publisher",
];

/// Packaging allowance applied to physical dimensions for the shipping
/// columns.
const SHIPPING_FACTOR: f64 = 1.1;

/// At most this many skipped products are carried in the result sample.
pub const SKIPPED_SAMPLE_LIMIT: usize = 20;

const BRAND_META_KEYS: [&str; 3] = ["_brand", "brand", "_yoast_wpseo_brand"];
const AUTHOR_META_KEYS: [&str; 3] = ["_author", "author", "book_author"];
const PUBLISHER_META_KEYS: [&str; 2] = ["_publisher", "publisher"];
const LANGUAGE_META_KEYS: [&str; 2] = ["_language", "language"];
const FORMAT_META_KEYS: [&str; 2] = ["_format", "format"];
const YEAR_META_KEYS: [&str; 3] = ["_year", "year", "publication_year"];
const VOLUME_META_KEYS: [&str; 2] = ["_volume_ml", "volume_ml"];
const CONDITION_META_KEYS: [&str; 3] = ["_condition", "condition", "product_condition"];
const GOOGLE_CATEGORY_META_KEYS: [&str; 3] = [
    "_google_product_category",
    "google_product_category",
    "_wpseo_primary_product_cat",
];
const SELLER_CATEGORY_META_KEYS: [&str; 2] = ["_seller_category", "seller_category"];
const SIZE_ATTRIBUTE_NAMES: [&str; 2] = ["size", "pa_size"];
const COLOUR_ATTRIBUTE_NAMES: [&str; 4] = ["color", "colour", "pa_color", "pa_colour"];

/// Feed-wide settings resolved once per generation.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub country: String,
    pub currency: String,
    pub tax_rate: f64,
    pub language: String,
    pub delivery_time_days: u32,
    pub return_days: u32,
    pub dimension_unit: DimensionUnit,
    pub weight_unit: WeightUnit,
    pub filename_pattern: String,
    pub keep_exports: usize,
    /// Progress is logged every this many rows.
    pub batch_size: usize,
}

impl FeedSettings {
    pub fn from_config(cfg: &FeedConfig) -> Self {
        Self {
            country: cfg.country.clone(),
            currency: cfg.currency.clone(),
            tax_rate: round2(cfg.tax_rate),
            language: cfg.language.clone(),
            delivery_time_days: cfg.delivery_time_days,
            return_days: cfg.return_days,
            dimension_unit: DimensionUnit::from_code(&cfg.dimension_unit)
                .unwrap_or(DimensionUnit::Cm),
            weight_unit: WeightUnit::from_code(&cfg.weight_unit).unwrap_or(WeightUnit::Kg),
            filename_pattern: cfg.filename_pattern.clone(),
            keep_exports: cfg.keep_exports,
            batch_size: cfg.batch_size,
        }
    }
}

/// Rows ready to write plus everything that was left out.
#[derive(Debug, Default)]
pub struct FeedRows {
    pub rows: Vec<Vec<String>>,
    pub skipped: Vec<SkippedProduct>,
}

/// Strip the description down to basic formatting tags and collapse
/// runs of whitespace into single spaces.
pub fn clean_description(html: &str) -> String {
    let allowed: HashSet<&str> = ["p", "br", "strong", "b", "em", "i", "ul", "ol", "li"]
        .into_iter()
        .collect();
    let cleaned = ammonia::Builder::default()
        .tags(allowed)
        .generic_attributes(HashSet::new())
        .link_rel(None)
        .clean(html)
        .to_string();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn convert_dimension(value: Option<f64>, unit: DimensionUnit) -> Option<f64> {
    value.filter(|v| *v > 0.0).map(|v| round2(unit.to_mm(v)))
}

fn convert_weight(value: Option<f64>, unit: WeightUnit) -> Option<f64> {
    value.filter(|v| *v > 0.0).map(|v| round2(unit.to_grams(v)))
}

fn shipping_value(base: Option<f64>) -> Option<f64> {
    base.map(|v| round2(v * SHIPPING_FACTOR))
}

fn optional_amount(value: Option<f64>) -> String {
    value.map(format_amount).unwrap_or_default()
}

fn image_at(images: &[String], index: usize) -> String {
    images.get(index).cloned().unwrap_or_default()
}

enum RowOutcome {
    Row(Vec<String>),
    Skipped(SkippedProduct),
}

fn build_row(
    view: ProductView<'_>,
    categories: &[ProductCategory],
    settings: &FeedSettings,
) -> RowOutcome {
    let product = view.product;

    let gtin = view.gtin();
    let price = product.effective_price().filter(|p| *p > 0.0);

    let (gtin, price) = match (gtin, price) {
        (Some(g), Some(p)) => (g, p),
        (gtin, _) => {
            let reason = if gtin.is_none() {
                "missing_gtin"
            } else {
                "missing_price"
            };
            return RowOutcome::Skipped(SkippedProduct {
                product_id: product.id.value(),
                sku: product.sku.clone(),
                name: product.name.clone(),
                reason: reason.to_string(),
            });
        }
    };

    let condition = product
        .meta_first(&CONDITION_META_KEYS)
        .map(|v| v.to_lowercase())
        .unwrap_or_else(|| "new".to_string());

    let length = convert_dimension(view.length(), settings.dimension_unit);
    let width = convert_dimension(view.width(), settings.dimension_unit);
    let height = convert_dimension(view.height(), settings.dimension_unit);
    let weight = convert_weight(view.weight(), settings.weight_unit);

    let images = view.images();
    let category = deepest_category_path(categories, view.category_ids()).unwrap_or_default();

    let meta = |keys: &[&str]| view.meta_first(keys).unwrap_or_default().to_string();
    let attribute = |names: &[&str]| {
        product
            .attribute_first(names)
            .unwrap_or_default()
            .to_string()
    };

    let language = view
        .meta_first(&LANGUAGE_META_KEYS)
        .map(|v| v.to_string())
        .unwrap_or_else(|| settings.language.clone());

    let row = vec![
        gtin,
        product.name.clone(),
        settings.country.clone(),
        condition,
        format_amount(price),
        format_amount(settings.tax_rate),
        settings.currency.clone(),
        settings.delivery_time_days.to_string(),
        product.stock_quantity.unwrap_or(0).max(0).to_string(),
        settings.return_days.to_string(),
        image_at(images, 0),
        meta(&BRAND_META_KEYS),
        category,
        meta(&GOOGLE_CATEGORY_META_KEYS),
        meta(&SELLER_CATEGORY_META_KEYS),
        clean_description(view.description()),
        optional_amount(length),
        optional_amount(width),
        optional_amount(height),
        optional_amount(weight),
        optional_amount(shipping_value(length)),
        optional_amount(shipping_value(width)),
        optional_amount(shipping_value(height)),
        optional_amount(shipping_value(weight)),
        meta(&VOLUME_META_KEYS),
        attribute(&SIZE_ATTRIBUTE_NAMES),
        attribute(&COLOUR_ATTRIBUTE_NAMES),
        image_at(images, 1),
        image_at(images, 2),
        image_at(images, 3),
        image_at(images, 4),
        String::new(),
        meta(&AUTHOR_META_KEYS),
        language,
        meta(&FORMAT_META_KEYS),
        meta(&YEAR_META_KEYS),
        meta(&PUBLISHER_META_KEYS),
    ];

    RowOutcome::Row(row)
}

/// Build feed rows for the whole catalog. Products with variations are
/// exported one row per variation; the parent itself produces no row.
pub fn build_rows(
    products: &[Product],
    categories: &[ProductCategory],
    settings: &FeedSettings,
) -> FeedRows {
    let mut out = FeedRows::default();

    let mut push = |outcome: RowOutcome| match outcome {
        RowOutcome::Row(row) => out.rows.push(row),
        RowOutcome::Skipped(skipped) => out.skipped.push(skipped),
    };

    for product in products.iter().filter(|p| p.parent_id.is_none()) {
        let variations: Vec<&Product> = products
            .iter()
            .filter(|v| v.parent_id == Some(product.id))
            .collect();

        if variations.is_empty() {
            push(build_row(ProductView::new(product, None), categories, settings));
        } else {
            for variation in variations {
                push(build_row(
                    ProductView::new(variation, Some(product)),
                    categories,
                    settings,
                ));
            }
        }
    }

    out
}

/// Expand the filename pattern. Unknown or empty patterns fall back to
/// the default, and the extension is forced to .csv.
pub fn expand_filename_pattern(pattern: &str, now: DateTime<Utc>) -> String {
    let pattern = if pattern.is_empty() || !pattern.contains('{') {
        "products_{date}.csv"
    } else {
        pattern
    };

    let mut filename = pattern
        .replace("{date}", &now.format("%Y-%m-%d").to_string())
        .replace("{datetime}", &now.format("%Y-%m-%d_%H-%M-%S").to_string())
        .replace("{timestamp}", &now.timestamp().to_string());

    if !filename.ends_with(".csv") {
        filename.push_str(".csv");
    }

    // Keep the name safe as a plain file name
    filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            other => other,
        })
        .collect()
}

/// Write the feed to `export_dir` and return what happened. The file
/// starts with a UTF-8 BOM so spreadsheet tools detect the encoding.
pub fn generate_feed(
    products: &[Product],
    categories: &[ProductCategory],
    settings: &FeedSettings,
    export_dir: &Path,
) -> Result<FeedResult> {
    let feed = build_rows(products, categories, settings);

    std::fs::create_dir_all(export_dir)
        .with_context(|| format!("failed to create export directory {}", export_dir.display()))?;
    let filename = expand_filename_pattern(&settings.filename_pattern, Utc::now());
    let path = export_dir.join(&filename);

    let mut file = std::fs::File::create(&path)
        .with_context(|| format!("failed to create feed file {}", path.display()))?;
    file.write_all(b"\xEF\xBB\xBF")?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(FEED_COLUMNS)?;
    let batch = settings.batch_size.max(1);
    for (idx, row) in feed.rows.iter().enumerate() {
        writer.write_record(row)?;
        if (idx + 1) % batch == 0 {
            tracing::info!("Feed progress: {} / {} rows", idx + 1, feed.rows.len());
        }
    }
    writer.flush()?;

    let file_size = std::fs::metadata(&path)?.len();
    let mut skipped_sample = feed.skipped;
    let skipped_count = skipped_sample.len() as u64;
    skipped_sample.truncate(SKIPPED_SAMPLE_LIMIT);

    Ok(FeedResult {
        file_path: path.to_string_lossy().to_string(),
        file_size,
        rows_written: feed.rows.len() as u64,
        skipped_count,
        skipped_sample,
    })
}

/// Keep only the newest `keep` exports in the directory. Returns how
/// many files were removed.
pub fn cleanup_old_exports(export_dir: &Path, keep: usize) -> Result<usize> {
    let mut files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    let entries = match std::fs::read_dir(export_dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(0),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "csv").unwrap_or(false) {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }
    }

    if files.len() <= keep {
        return Ok(0);
    }

    files.sort_by(|a, b| b.1.cmp(&a.1));
    let mut removed = 0;
    for (path, _) in files.into_iter().skip(keep) {
        if std::fs::remove_file(path).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contracts::domain::a001_product::ProductId;
    use std::collections::BTreeMap;

    fn settings() -> FeedSettings {
        FeedSettings {
            country: "DE".into(),
            currency: "EUR".into(),
            tax_rate: 19.0,
            language: "ger".into(),
            delivery_time_days: 3,
            return_days: 14,
            dimension_unit: DimensionUnit::Cm,
            weight_unit: WeightUnit::Kg,
            filename_pattern: "products_{date}.csv".into(),
            keep_exports: 5,
            batch_size: 100,
        }
    }

    fn product(id: i64) -> Product {
        Product {
            id: ProductId(id),
            parent_id: None,
            sku: format!("SKU-{id}"),
            name: format!("Product {id}"),
            description: String::new(),
            regular_price: None,
            sale_price: None,
            stock_quantity: Some(4),
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

    fn sellable(id: i64) -> Product {
        let mut p = product(id);
        p.regular_price = Some(19.99);
        p.meta.insert("_gtin".into(), format!("400638133393{id}"));
        p
    }

    #[test]
    fn rows_and_skips_are_accounted_for() {
        let ok = sellable(1);

        let mut no_gtin = product(2);
        no_gtin.regular_price = Some(9.99);

        let mut no_price = product(3);
        no_price.meta.insert("ean".into(), "9783161484100".into());

        let feed = build_rows(&[ok, no_gtin, no_price], &[], &settings());

        assert_eq!(feed.rows.len(), 1);
        assert_eq!(feed.skipped.len(), 2);
        assert_eq!(feed.rows[0].len(), FEED_COLUMNS.len());
        assert_eq!(feed.skipped[0].reason, "missing_gtin");
        assert_eq!(feed.skipped[0].product_id, 2);
        assert_eq!(feed.skipped[1].reason, "missing_price");
        assert_eq!(feed.skipped[1].product_id, 3);
    }

    #[test]
    fn shipping_dimensions_get_the_packaging_allowance() {
        let mut p = sellable(1);
        p.length = Some(10.0); // cm
        p.width = Some(5.0);
        p.height = Some(2.0);
        p.weight = Some(0.5); // kg

        let feed = build_rows(&[p], &[], &settings());
        let row = &feed.rows[0];

        let col = |name: &str| {
            let idx = FEED_COLUMNS.iter().position(|c| *c == name).unwrap();
            row[idx].parse::<f64>().unwrap()
        };

        assert!((col("length_mm") - 100.0).abs() < 0.01);
        assert!((col("weight_g") - 500.0).abs() < 0.01);
        assert!((col("shipping_length_mm") - 110.0).abs() < 0.01);
        assert!((col("shipping_width_mm") - 55.0).abs() < 0.01);
        assert!((col("shipping_height_mm") - 22.0).abs() < 0.01);
        assert!((col("shipping_weight_g") - 550.0).abs() < 0.01);
    }

    #[test]
    fn variations_inherit_parent_fields() {
        let mut parent = sellable(1);
        parent.description = "<p>Shared   description</p>".into();
        parent.category_ids = vec![2];

        let mut variation = product(2);
        variation.parent_id = Some(ProductId(1));
        variation.regular_price = Some(24.99);

        let categories = vec![
            ProductCategory { id: 1, parent_id: None, name: "Books".into() },
            ProductCategory { id: 2, parent_id: Some(1), name: "Crime".into() },
        ];

        let feed = build_rows(&[parent, variation], &[], &settings());
        // parent with variations produces no row of its own
        assert_eq!(feed.rows.len(), 1);
        let row = &feed.rows[0];
        assert_eq!(row[0], "4006381333931"); // gtin from parent
        assert_eq!(row[4], "24.99"); // variation's own price

        let feed = build_rows(
            &[sellable_with_categories(&categories)],
            &categories,
            &settings(),
        );
        let idx = FEED_COLUMNS.iter().position(|c| *c == "category").unwrap();
        assert_eq!(feed.rows[0][idx], "Books > Crime");
    }

    fn sellable_with_categories(_categories: &[ProductCategory]) -> Product {
        let mut p = sellable(9);
        p.category_ids = vec![2];
        p
    }

    #[test]
    fn description_is_cleaned() {
        let html = "<div>Hello <script>alert(1)</script><strong>world</strong></div>\n\n  and   more";
        assert_eq!(clean_description(html), "Hello <strong>world</strong> and more");
    }

    #[test]
    fn filename_pattern_expansion() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 9, 30, 15).unwrap();
        assert_eq!(
            expand_filename_pattern("products_{date}.csv", now),
            "products_2025-03-07.csv"
        );
        assert_eq!(
            expand_filename_pattern("feed_{datetime}", now),
            "feed_2025-03-07_09-30-15.csv"
        );
        // empty and brace-less patterns fall back to the default
        assert_eq!(expand_filename_pattern("", now), "products_2025-03-07.csv");
        assert_eq!(
            expand_filename_pattern("plain-name", now),
            "products_2025-03-07.csv"
        );
        // path separators are neutralised
        assert_eq!(
            expand_filename_pattern("a/b_{date}.csv", now),
            "a-b_2025-03-07.csv"
        );
    }

    #[test]
    fn generated_file_starts_with_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let result = generate_feed(&[sellable(1)], &[], &settings(), dir.path()).unwrap();

        assert_eq!(result.rows_written, 1);
        assert_eq!(result.skipped_count, 0);

        let bytes = std::fs::read(&result.file_path).unwrap();
        assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");
        let text = String::from_utf8_lossy(&bytes[3..]).to_string();
        assert!(text.starts_with("gtin,title,country"));
        assert_eq!(result.file_size, bytes.len() as u64);
    }

    #[test]
    fn unwritable_export_dir_error_names_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let export_dir = blocker.join("exports");

        let err = generate_feed(&[sellable(1)], &[], &settings(), &export_dir).unwrap_err();
        let rendered = format!("{err:#}");
        assert!(rendered.contains("export directory"));
        assert!(rendered.contains(&export_dir.display().to_string()));
    }

    #[test]
    fn old_exports_are_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..7 {
            std::fs::write(dir.path().join(format!("export_{i}.csv")), "x").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        let removed = cleanup_old_exports(dir.path(), 5).unwrap();
        assert_eq!(removed, 2);

        let remaining: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(remaining.len(), 6); // 5 csv + notes.txt
    }
}

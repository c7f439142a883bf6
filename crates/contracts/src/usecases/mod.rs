pub mod u101_product_feed_sync;
pub mod u102_order_import;

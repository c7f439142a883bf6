pub mod a001_product;
pub mod a002_sales_order;

pub mod response;

pub use response::{FeedResult, ProductSyncStats, SkippedProduct, UploadResult};

pub mod pipeline;
pub mod pipelines;
pub mod worker;

pub use pipeline::{run_pipeline, SyncPipeline};
pub use pipelines::{OrderImportPipeline, ProductSyncPipeline};
pub use worker::SyncWorker;

pub mod executor;
pub mod feed_generator;
pub mod sftp_uploader;

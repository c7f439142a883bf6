pub mod executor;
pub mod nalda_api_client;
pub mod processors;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub nalda: NaldaConfig,
    pub sftp: SftpConfig,
    pub feed: FeedConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NaldaConfig {
    pub api_url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SftpConfig {
    pub host: String,
    #[serde(default = "default_sftp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub remote_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub export_dir: String,
    #[serde(default = "default_filename_pattern")]
    pub filename_pattern: String,
    #[serde(default = "default_keep_exports")]
    pub keep_exports: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    pub country: String,
    pub currency: String,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_delivery_time_days")]
    pub delivery_time_days: u32,
    #[serde(default = "default_return_days")]
    pub return_days: u32,
    #[serde(default = "default_dimension_unit")]
    pub dimension_unit: String,
    #[serde(default = "default_weight_unit")]
    pub weight_unit: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_import_mode")]
    pub order_import_mode: String,
    #[serde(default = "default_order_range")]
    pub order_range: String,
    /// ISO dates bounding the window when `order_range = "custom"`.
    #[serde(default)]
    pub order_from: Option<String>,
    #[serde(default)]
    pub order_to: Option<String>,
    #[serde(default = "default_product_schedule")]
    pub product_schedule: String,
    #[serde(default = "default_order_schedule")]
    pub order_schedule: String,
    #[serde(default = "default_worker_interval_secs")]
    pub worker_interval_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_sftp_port() -> u16 {
    22
}
fn default_filename_pattern() -> String {
    "products_{date}.csv".to_string()
}
fn default_keep_exports() -> usize {
    5
}
fn default_batch_size() -> usize {
    100
}
fn default_language() -> String {
    "ger".to_string()
}
fn default_delivery_time_days() -> u32 {
    3
}
fn default_return_days() -> u32 {
    14
}
fn default_dimension_unit() -> String {
    "cm".to_string()
}
fn default_weight_unit() -> String {
    "kg".to_string()
}
fn default_source() -> String {
    "nalda".to_string()
}
fn default_import_mode() -> String {
    "all".to_string()
}
fn default_order_range() -> String {
    "today".to_string()
}
fn default_product_schedule() -> String {
    "daily".to_string()
}
fn default_order_schedule() -> String {
    "hourly".to_string()
}
fn default_worker_interval_secs() -> u64 {
    60
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/nalda-sync.db"

[nalda]
api_url = "https://seller-api.nalda.com/api/v1"
api_key = ""

[sftp]
host = ""
port = 22
username = ""
password = ""
remote_dir = "/upload"

[feed]
export_dir = "target/exports"
filename_pattern = "products_{datetime}.csv"
keep_exports = 5
batch_size = 100
country = "DE"
currency = "EUR"
tax_rate = 19.0
language = "ger"
delivery_time_days = 3
return_days = 14
dimension_unit = "cm"
weight_unit = "kg"

[sync]
source = "nalda"
order_import_mode = "all"
order_range = "today"
# order_from / order_to bound the window when order_range = "custom":
# order_from = "2025-01-01"
# order_to = "2025-01-31"
product_schedule = "daily"
order_schedule = "hourly"
worker_interval_secs = 60
"#;

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Current working directory
/// 3. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            }
        }
    }

    let cwd_config = Path::new("config.toml");
    if cwd_config.exists() {
        tracing::info!("Loading config from: {}", cwd_config.display());
        let contents = std::fs::read_to_string(cwd_config)?;
        let config: Config = toml::from_str(&contents)?;
        return Ok(config);
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Install the loaded configuration process-wide.
pub fn init(config: Config) -> anyhow::Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("configuration already initialized"))
}

pub fn get() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

/// Resolve a configured path. Absolute paths are used as-is, relative
/// paths resolve against the executable directory, then the cwd.
pub fn resolve_path(configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(path);
        }
    }
    PathBuf::from(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/nalda-sync.db");
        assert_eq!(config.sftp.port, 22);
        assert_eq!(config.feed.keep_exports, 5);
        assert_eq!(config.feed.language, "ger");
        assert_eq!(config.sync.order_import_mode, "all");
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let minimal = r#"
            [database]
            path = "x.db"
            [nalda]
            api_url = "https://example.test"
            api_key = "k"
            [sftp]
            host = "h"
            username = "u"
            password = "p"
            remote_dir = "/in"
            [feed]
            export_dir = "out"
            country = "AT"
            currency = "EUR"
            [sync]
        "#;
        let config: Config = toml::from_str(minimal).unwrap();
        assert_eq!(config.nalda.timeout_secs, 30);
        assert_eq!(config.feed.delivery_time_days, 3);
        assert_eq!(config.feed.return_days, 14);
        assert_eq!(config.sync.order_range, "today");
        assert_eq!(config.sync.order_from, None);
        assert_eq!(config.sync.order_to, None);
    }

    #[test]
    fn custom_order_window_parses() {
        let raw = r#"
            [database]
            path = "x.db"
            [nalda]
            api_url = "https://example.test"
            api_key = "k"
            [sftp]
            host = "h"
            username = "u"
            password = "p"
            remote_dir = "/in"
            [feed]
            export_dir = "out"
            country = "AT"
            currency = "EUR"
            [sync]
            order_range = "custom"
            order_from = "2025-01-01"
            order_to = "2025-01-31"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.sync.order_range, "custom");
        assert_eq!(config.sync.order_from.as_deref(), Some("2025-01-01"));
        assert_eq!(config.sync.order_to.as_deref(), Some("2025-01-31"));
    }
}

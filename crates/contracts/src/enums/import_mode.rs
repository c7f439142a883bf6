use serde::{Deserialize, Serialize};

/// Controls whether the order import creates new local orders or only
/// refreshes orders that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    #[default]
    All,
    SyncOnly,
}

impl ImportMode {
    pub fn code(&self) -> &'static str {
        match self {
            ImportMode::All => "all",
            ImportMode::SyncOnly => "sync_only",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "all" => Some(ImportMode::All),
            "sync_only" => Some(ImportMode::SyncOnly),
            _ => None,
        }
    }
}

use serde::{Deserialize, Serialize};

/// Severity of a sync log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn code(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "info" => Some(LogLevel::Info),
            "success" => Some(LogLevel::Success),
            "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn all() -> Vec<LogLevel> {
        vec![
            LogLevel::Info,
            LogLevel::Success,
            LogLevel::Warning,
            LogLevel::Error,
        ]
    }
}

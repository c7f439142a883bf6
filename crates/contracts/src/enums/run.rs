use serde::{Deserialize, Serialize};

/// Final outcome of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn code(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }
}

/// How a sync run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTrigger {
    Manual,
    Scheduled,
}

impl RunTrigger {
    pub fn code(&self) -> &'static str {
        match self {
            RunTrigger::Manual => "manual",
            RunTrigger::Scheduled => "scheduled",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "manual" => Some(RunTrigger::Manual),
            "scheduled" => Some(RunTrigger::Scheduled),
            _ => None,
        }
    }
}

/// Recurrence of a scheduled sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleRecurrence {
    Hourly,
    TwiceDaily,
    Daily,
    Weekly,
    /// Interval in whole minutes.
    Custom(u64),
}

impl ScheduleRecurrence {
    /// Interval between runs, in seconds.
    pub fn interval_secs(&self) -> u64 {
        match self {
            ScheduleRecurrence::Hourly => 3600,
            ScheduleRecurrence::TwiceDaily => 12 * 3600,
            ScheduleRecurrence::Daily => 24 * 3600,
            ScheduleRecurrence::Weekly => 7 * 24 * 3600,
            ScheduleRecurrence::Custom(minutes) => minutes * 60,
        }
    }

    /// Parse a recurrence from its config spelling. Custom intervals are
    /// written as a bare number of minutes.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "hourly" => Some(ScheduleRecurrence::Hourly),
            "twice_daily" => Some(ScheduleRecurrence::TwiceDaily),
            "daily" => Some(ScheduleRecurrence::Daily),
            "weekly" => Some(ScheduleRecurrence::Weekly),
            other => other.parse::<u64>().ok().filter(|m| *m > 0).map(ScheduleRecurrence::Custom),
        }
    }
}

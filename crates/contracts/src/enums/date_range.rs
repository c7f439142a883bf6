use serde::{Deserialize, Serialize};

/// Date range selector accepted by the Nalda orders API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "yesterday")]
    Yesterday,
    #[serde(rename = "current-month")]
    CurrentMonth,
    #[serde(rename = "current-year")]
    CurrentYear,
    #[serde(rename = "3m")]
    Last3Months,
    #[serde(rename = "6m")]
    Last6Months,
    #[serde(rename = "12m")]
    Last12Months,
    #[serde(rename = "24m")]
    Last24Months,
    #[serde(rename = "custom")]
    Custom,
}

impl DateRange {
    pub fn code(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::Yesterday => "yesterday",
            DateRange::CurrentMonth => "current-month",
            DateRange::CurrentYear => "current-year",
            DateRange::Last3Months => "3m",
            DateRange::Last6Months => "6m",
            DateRange::Last12Months => "12m",
            DateRange::Last24Months => "24m",
            DateRange::Custom => "custom",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "today" => Some(DateRange::Today),
            "yesterday" => Some(DateRange::Yesterday),
            "current-month" => Some(DateRange::CurrentMonth),
            "current-year" => Some(DateRange::CurrentYear),
            "3m" => Some(DateRange::Last3Months),
            "6m" => Some(DateRange::Last6Months),
            "12m" => Some(DateRange::Last12Months),
            "24m" => Some(DateRange::Last24Months),
            "custom" => Some(DateRange::Custom),
            _ => None,
        }
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::DateRange;

/// Parameters for fetching orders from the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFetchRequest {
    pub range: DateRange,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl OrderFetchRequest {
    pub fn range(range: DateRange) -> Self {
        Self { range, from: None, to: None }
    }

    pub fn custom(from: NaiveDate, to: NaiveDate) -> Self {
        Self { range: DateRange::Custom, from: Some(from), to: Some(to) }
    }

    /// A custom range must carry both bounds; fixed ranges must not be
    /// narrowed by explicit dates.
    pub fn validate(&self) -> Result<(), String> {
        match self.range {
            DateRange::Custom => {
                if self.from.is_none() || self.to.is_none() {
                    return Err("custom range requires both from and to dates".to_string());
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_range_requires_both_bounds() {
        let incomplete = OrderFetchRequest {
            range: DateRange::Custom,
            from: Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            to: None,
        };
        assert!(incomplete.validate().is_err());

        let complete = OrderFetchRequest::custom(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        );
        assert!(complete.validate().is_ok());
    }

    #[test]
    fn fixed_ranges_validate_without_dates() {
        assert!(OrderFetchRequest::range(DateRange::Last3Months).validate().is_ok());
        assert!(OrderFetchRequest::range(DateRange::Today).validate().is_ok());
    }
}

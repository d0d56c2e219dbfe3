//! The Indian financial year: 1 April of year Y to 31 March of year Y+1.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A financial year, identified by its starting calendar year `start_year`
/// (so FY 2024-25 has `start_year = 2024`).
///
/// A date's FY is always derived from its `txn_date`; nothing stores it
/// redundantly alongside a date-carrying row (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FinancialYear {
    pub start_year: i32,
}

impl FinancialYear {
    pub fn new(start_year: i32) -> Self {
        FinancialYear { start_year }
    }

    /// Derive the FY containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        if date.month() >= 4 {
            FinancialYear::new(date.year())
        } else {
            FinancialYear::new(date.year() - 1)
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, 4, 1).expect("valid FY start date")
    }

    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year + 1, 3, 31).expect("valid FY end date")
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// The assessment year following this financial year, e.g. FY 2024-25 -> AY 2025-26.
    pub fn assessment_year(&self) -> FinancialYear {
        FinancialYear::new(self.start_year + 1)
    }

    pub fn next(&self) -> FinancialYear {
        FinancialYear::new(self.start_year + 1)
    }

    pub fn previous(&self) -> FinancialYear {
        FinancialYear::new(self.start_year - 1)
    }
}

impl fmt::Display for FinancialYear {
    /// Renders as `YYYY-YY`, e.g. `2024-25`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, (self.start_year + 1) % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_fy_across_the_april_boundary() {
        assert_eq!(
            FinancialYear::of(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()),
            FinancialYear::new(2023)
        );
        assert_eq!(
            FinancialYear::of(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()),
            FinancialYear::new(2024)
        );
    }

    #[test]
    fn renders_as_yyyy_yy() {
        assert_eq!(FinancialYear::new(2024).to_string(), "2024-25");
        assert_eq!(FinancialYear::new(2099).to_string(), "2099-00");
    }

    #[test]
    fn grandfathering_cutoff_lies_in_fy_2017_18() {
        let cutoff = NaiveDate::from_ymd_opt(2018, 1, 31).unwrap();
        assert_eq!(FinancialYear::of(cutoff), FinancialYear::new(2017));
    }
}

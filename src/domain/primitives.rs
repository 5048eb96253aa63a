//! Domain primitives: PspName, MonthRef.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest and highest year a ledger month may be requested for.
pub const MIN_LEDGER_YEAR: i32 = 2000;
pub const MAX_LEDGER_YEAR: i32 = 2100;

/// Payment service provider name: trimmed, upper-cased, never empty.
///
/// Every store is written and queried with this canonical form, so `Papara`
/// and `PAPARA` name the same ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PspName(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("PSP name must not be empty")]
pub struct PspNameError;

impl PspName {
    pub fn parse(raw: &str) -> Result<Self, PspNameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PspNameError);
        }
        Ok(PspName(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PspName {
    type Error = PspNameError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        PspName::parse(&raw)
    }
}

impl From<PspName> for String {
    fn from(psp: PspName) -> Self {
        psp.0
    }
}

impl std::fmt::Display for PspName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthRefError {
    #[error("month must be between 1 and 12, got {0}")]
    Month(u32),
    #[error("year must be between 2000 and 2100, got {0}")]
    Year(i32),
}

/// A validated calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthRef {
    year: i32,
    month: u32,
}

impl MonthRef {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthRefError> {
        if !(1..=12).contains(&month) {
            return Err(MonthRefError::Month(month));
        }
        if !(MIN_LEDGER_YEAR..=MAX_LEDGER_YEAR).contains(&year) {
            return Err(MonthRefError::Year(year));
        }
        Ok(MonthRef { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Validated in `new`, so day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day() + chrono::Duration::days(i64::from(self.days_in_month()) - 1)
    }

    pub fn days_in_month(&self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .map(|next| (next - self.first_day()).num_days() as u32)
            .unwrap_or(31)
    }

    /// Every calendar day of the month, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.first_day().iter_days().take(self.days_in_month() as usize)
    }
}

impl std::fmt::Display for MonthRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// True for the first calendar day of any month.
pub fn is_month_start(date: NaiveDate) -> bool {
    date.day() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psp_name_is_trimmed() {
        let psp = PspName::parse("  PAPARA ").unwrap();
        assert_eq!(psp.as_str(), "PAPARA");
        assert_eq!(psp.to_string(), "PAPARA");
    }

    #[test]
    fn test_psp_name_rejects_blank() {
        assert_eq!(PspName::parse(""), Err(PspNameError));
        assert_eq!(PspName::parse("   "), Err(PspNameError));
    }

    #[test]
    fn test_psp_name_is_canonical_upper_case() {
        assert_eq!(PspName::parse("Papara").unwrap(), PspName::parse("PAPARA").unwrap());
        assert_eq!(PspName::parse(" tether ").unwrap().as_str(), "TETHER");
    }

    #[test]
    fn test_psp_name_deserializes_canonically() {
        let psp: PspName = serde_json::from_str("\"papara\"").unwrap();
        assert_eq!(psp.as_str(), "PAPARA");
        assert!(serde_json::from_str::<PspName>("\"  \"").is_err());
        assert_eq!(serde_json::to_string(&psp).unwrap(), "\"PAPARA\"");
    }

    #[test]
    fn test_month_ref_rejects_bad_month() {
        assert_eq!(MonthRef::new(2025, 0), Err(MonthRefError::Month(0)));
        assert_eq!(MonthRef::new(2025, 13), Err(MonthRefError::Month(13)));
    }

    #[test]
    fn test_month_ref_rejects_implausible_year() {
        assert_eq!(MonthRef::new(1999, 5), Err(MonthRefError::Year(1999)));
        assert_eq!(MonthRef::new(2101, 5), Err(MonthRefError::Year(2101)));
        assert!(MonthRef::new(2000, 1).is_ok());
        assert!(MonthRef::new(2100, 12).is_ok());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(MonthRef::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthRef::new(2025, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthRef::new(2025, 4).unwrap().days_in_month(), 30);
        assert_eq!(MonthRef::new(2025, 12).unwrap().days_in_month(), 31);
    }

    #[test]
    fn test_days_iterates_whole_month() {
        let month = MonthRef::new(2025, 12).unwrap();
        let days: Vec<_> = month.days().collect();
        assert_eq!(days.len(), 31);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(days[30], NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(month.last_day(), days[30]);
    }

    #[test]
    fn test_is_month_start() {
        assert!(is_month_start(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
        assert!(!is_month_start(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()));
    }

    #[test]
    fn test_month_ref_display() {
        assert_eq!(MonthRef::new(2025, 3).unwrap().to_string(), "2025-03");
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive calendar range used to filter stored transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            DateRange { start, end }
        } else {
            DateRange { start: end, end: start }
        }
    }

    /// Open-ended ranges from CLI-style optional bounds. Missing ends are
    /// clamped to four-digit years so the bounds still sort as ISO text.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        let earliest = NaiveDate::from_ymd_opt(1, 1, 1)?;
        let latest = NaiveDate::from_ymd_opt(9999, 12, 31)?;
        match (start, end) {
            (None, None) => None,
            (Some(s), None) => Some(DateRange::new(s, latest)),
            (None, Some(e)) => Some(DateRange::new(earliest, e)),
            (Some(s), Some(e)) => Some(DateRange::new(s, e)),
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

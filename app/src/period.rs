//! Calendar months in the reporting timezone, which is fixed to UTC. A month starts at 00:00 UTC
//! on its first day regardless of where the server or the database runs.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// The month that `timestamp` falls into.
    pub fn containing(timestamp: DateTime<Utc>) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The calendar date of `timestamp` in the reporting timezone.
pub fn reporting_date(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.naive_utc().date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_boundaries_are_utc() {
        let end_of_year = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let new_year = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_ne!(Period::containing(end_of_year), Period::containing(new_year));
        assert_eq!(Period::containing(new_year).to_string(), "2024-01");
        assert_eq!(
            reporting_date(end_of_year),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn same_month_in_another_year_differs() {
        let a = Period::containing(Utc.with_ymd_and_hms(2023, 5, 10, 12, 0, 0).unwrap());
        let b = Period::containing(Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());
        assert_ne!(a, b);
        assert!(a < b);
    }
}

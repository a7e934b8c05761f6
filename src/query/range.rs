// src/query/range.rs

use chrono::{Local, NaiveDate};

use crate::error::{Error, Result};
use crate::records::DateAnnotation;

/// Inclusive date range. A single input date runs through today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Parse `"<date>"` or `"<date1>,<date2>"`, each strictly `YYYY-MM-DD`.
    /// Reversed endpoints are swapped.
    pub fn parse(text: &str) -> Result<DateRange> {
        let mut parts = text.split(',').map(str::trim);
        let first = parts.next().unwrap_or("");
        let start = parse_iso_date(first)?;
        let end = match parts.next() {
            Some(second) => parse_iso_date(second)?,
            None => Local::now().date_naive(),
        };
        if parts.next().is_some() {
            return Err(Error::InvalidDateFormat(text.to_string()));
        }
        Ok(if start <= end {
            DateRange { start, end }
        } else {
            DateRange {
                start: end,
                end: start,
            }
        })
    }

    /// A record is in range if its primary date or its corrected date
    /// (when present) falls within `[start, end]`.
    pub fn contains(&self, date: &DateAnnotation) -> bool {
        let within = |d: NaiveDate| d >= self.start && d <= self.end;
        within(date.primary) || date.corrected.map_or(false, within)
    }
}

fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| Error::InvalidDateFormat(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn two_dates_form_inclusive_range() {
        let range = DateRange::parse("2000-06-21,2002-12-14").unwrap();
        assert!(range.contains(&DateAnnotation::new(d("2000-06-21"))));
        assert!(range.contains(&DateAnnotation::new(d("2002-12-14"))));
        assert!(!range.contains(&DateAnnotation::new(d("2002-12-15"))));
    }

    #[test]
    fn reversed_endpoints_are_swapped() {
        let range = DateRange::parse("2002-12-14,2000-06-21").unwrap();
        assert_eq!(range.start, d("2000-06-21"));
        assert_eq!(range.end, d("2002-12-14"));
    }

    #[test]
    fn single_date_runs_through_today() {
        let range = DateRange::parse("2020-01-01").unwrap();
        assert_eq!(range.start, d("2020-01-01"));
        assert!(range.end >= d("2025-01-01"));
    }

    #[test]
    fn corrected_date_counts_for_matching() {
        let ann = DateAnnotation {
            primary: d("2011-12-13"),
            corrected: Some(d("2011-12-15")),
        };
        let range = DateRange::parse("2011-12-14,2011-12-16").unwrap();
        assert!(range.contains(&ann));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for bad in ["2020/01/01", "13 December 2011", "2020-01", "", "2020-01-01,x"] {
            assert!(
                matches!(DateRange::parse(bad), Err(Error::InvalidDateFormat(_))),
                "{bad:?} should not parse"
            );
        }
    }
}

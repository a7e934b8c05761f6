// src/extract/dates.rs
//
// Date cell normalization. Source tables carry dates in a handful of
// formats, occasionally with a "(corrected <date>)" annotation marking a
// later official correction to the published date.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::records::DateAnnotation;

static CORRECTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*corrected\s+([^)]+?)\s*\)").unwrap());

static ORDINAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})(st|nd|rd|th)\b").unwrap());

static YMD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap());

/// Parse a raw date cell into a `DateAnnotation`, splitting off the
/// corrected-date annotation first.
pub fn parse_annotated(raw: &str) -> Result<DateAnnotation> {
    let mut corrected = None;
    let mut primary_text = raw.trim().to_string();

    if let Some(caps) = CORRECTED_RE.captures(&primary_text) {
        corrected = Some(parse_date(caps.get(1).unwrap().as_str())?);
        let whole = caps.get(0).unwrap().range();
        primary_text.replace_range(whole, "");
    }

    let primary = parse_date(&primary_text)?;
    Ok(DateAnnotation { primary, corrected })
}

/// Parse a single date against the accepted formats, most common first:
/// `YYYY-MM-DD`, `D Month YYYY` (ordinal suffix stripped), `YYYY-DD-MM`
/// (only when the middle component exceeds 12), `DD/MM/YYYY`, `DD-MM-YYYY`.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let text = raw.trim().trim_end_matches('.').trim();

    if let Some(caps) = YMD_RE.captures(text) {
        let year: i32 = caps[1].parse().unwrap();
        let mid: u32 = caps[2].parse().unwrap();
        let last: u32 = caps[3].parse().unwrap();
        // Middle component above 12 can only be a day, so the source wrote
        // YYYY-DD-MM; anything else reads as YYYY-MM-DD.
        let (month, day) = if mid > 12 { (last, mid) } else { (mid, last) };
        return NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::DateFormat(raw.to_string()));
    }

    let deordinalized = ORDINAL_RE.replace(text, "$1");
    for fmt in ["%d %B %Y", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&deordinalized, fmt) {
            return Ok(d);
        }
    }

    Err(Error::DateFormat(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_date("2011-12-13").unwrap(), d("2011-12-13"));
        assert_eq!(parse_date("2011-12-13.").unwrap(), d("2011-12-13"));
    }

    #[test]
    fn parses_long_form_with_ordinal() {
        assert_eq!(parse_date("13 December 2011").unwrap(), d("2011-12-13"));
        assert_eq!(parse_date("3rd March 2020").unwrap(), d("2020-03-03"));
        assert_eq!(parse_date("1st January 1999").unwrap(), d("1999-01-01"));
    }

    #[test]
    fn year_day_month_only_when_unambiguous() {
        // 24 cannot be a month, so this is YYYY-DD-MM.
        assert_eq!(parse_date("2010-24-03").unwrap(), d("2010-03-24"));
        // Middle <= 12 always reads as YYYY-MM-DD.
        assert_eq!(parse_date("2010-03-04").unwrap(), d("2010-03-04"));
    }

    #[test]
    fn parses_slash_and_dash_day_first() {
        assert_eq!(parse_date("24/03/2010").unwrap(), d("2010-03-24"));
        assert_eq!(parse_date("24-03-2010").unwrap(), d("2010-03-24"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_date("Newsletter II-3"), Err(Error::DateFormat(_))));
        assert!(matches!(parse_date("2010-13-13"), Err(Error::DateFormat(_))));
        assert!(matches!(parse_date(""), Err(Error::DateFormat(_))));
    }

    #[test]
    fn corrected_annotation_is_split_off() {
        let ann = parse_annotated("2011-12-13 (corrected 2011-12-15)").unwrap();
        assert_eq!(ann.primary, d("2011-12-13"));
        assert_eq!(ann.corrected, Some(d("2011-12-15")));
        assert_eq!(ann.to_string(), "2011-12-13 (corrected 2011-12-15)");
    }

    #[test]
    fn corrected_annotation_in_long_form() {
        let ann = parse_annotated("13 December 2011 (corrected 15 December 2011)").unwrap();
        assert_eq!(ann.primary, d("2011-12-13"));
        assert_eq!(ann.corrected, Some(d("2011-12-15")));
    }

    #[test]
    fn display_round_trips_for_all_accepted_formats() {
        for raw in [
            "2011-12-13",
            "13 December 2011",
            "2010-24-03",
            "24/03/2010",
            "24-03-2010",
            "2011-12-13 (corrected 2011-12-15)",
        ] {
            let once = parse_annotated(raw).unwrap().to_string();
            let twice = parse_annotated(&once).unwrap().to_string();
            assert_eq!(once, twice, "round-trip failed for {raw:?}");
        }
    }

    #[test]
    fn year_comes_from_primary_only() {
        let ann = parse_annotated("2011-12-31 (corrected 2012-01-02)").unwrap();
        assert_eq!(ann.year(), 2011);
    }
}

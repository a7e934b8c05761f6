// src/records.rs

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;
use crate::extract::dates;

/// ISO 3166-1 alpha-2 code, uppercased and validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alpha2(String);

impl Alpha2 {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Alpha2 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Alpha2(trimmed.to_ascii_uppercase()))
        } else {
            Err(Error::InvalidAlphaCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for Alpha2 {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Alpha2> for String {
    fn from(a: Alpha2) -> String {
        a.0
    }
}

impl fmt::Display for Alpha2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Publication date of a change entry, with the optional later official
/// correction. The corrected date never changes the record's nominal year;
/// it only participates in date-range and search matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateAnnotation {
    pub primary: NaiveDate,
    pub corrected: Option<NaiveDate>,
}

impl DateAnnotation {
    pub fn new(primary: NaiveDate) -> Self {
        Self {
            primary,
            corrected: None,
        }
    }

    /// Year used for grouping and year-expression matching.
    pub fn year(&self) -> i32 {
        use chrono::Datelike;
        self.primary.year()
    }

    /// The literal date strings this annotation covers, primary first.
    pub fn literal_dates(&self) -> Vec<String> {
        let mut out = vec![self.primary.to_string()];
        if let Some(c) = self.corrected {
            out.push(c.to_string());
        }
        out
    }
}

impl fmt::Display for DateAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.corrected {
            Some(c) => write!(f, "{} (corrected {})", self.primary, c),
            None => write!(f, "{}", self.primary),
        }
    }
}

impl Serialize for DateAnnotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateAnnotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        dates::parse_annotated(&raw).map_err(serde::de::Error::custom)
    }
}

/// One canonical subdivision-code change entry. The serde keys are the
/// exact field names consumed by the downstream JSON/CSV/XML writers and
/// must not be renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "Change")]
    pub change: String,
    #[serde(rename = "Description of Change")]
    pub description_of_change: String,
    #[serde(rename = "Date Issued")]
    pub date_issued: DateAnnotation,
    #[serde(rename = "Source")]
    pub source: String,
}

impl CanonicalRecord {
    /// Count of non-empty canonical fields; the dedup tie-breaker. The date
    /// always counts: a record cannot be assembled without one.
    pub fn completeness(&self) -> usize {
        1 + [&self.change, &self.description_of_change, &self.source]
            .iter()
            .filter(|f| !f.is_empty())
            .count()
    }
}

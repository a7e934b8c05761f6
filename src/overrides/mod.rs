// src/overrides/mod.rs
//
// Hand-authored corrections for known upstream data defects, kept as a
// versioned JSON table rather than code so they can be tested and evolved
// independently of the pipeline.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::dates;
use crate::records::{Alpha2, CanonicalRecord};

/// Field targeted by a `SetField` override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Change,
    DescriptionOfChange,
    DateIssued,
    Source,
}

/// One patch operation. Records are matched by exact
/// `(change.to_lowercase(), primary date)` when `change` is given, or by
/// primary date alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ManualOverride {
    Add {
        record: CanonicalRecord,
    },
    SetField {
        date: NaiveDate,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        change: Option<String>,
        field: Field,
        value: String,
    },
    Delete {
        date: NaiveDate,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        change: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub country: Alpha2,
    #[serde(flatten)]
    pub op: ManualOverride,
}

/// The full patch list, applied in declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideTable {
    pub version: u32,
    pub entries: Vec<OverrideEntry>,
}

static BUILTIN: Lazy<OverrideTable> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../data/overrides.json"))
        .expect("bundled overrides.json is valid")
});

impl OverrideTable {
    /// The table bundled with the crate.
    pub fn builtin() -> &'static OverrideTable {
        &BUILTIN
    }

    pub fn load(path: impl AsRef<Path>) -> Result<OverrideTable> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading override table {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing override table {}", path.display()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every entry declared for `alpha2`, in order. Entries for
    /// countries absent from the current run are skipped by the caller;
    /// the table is shared across partial extraction runs.
    pub fn apply(&self, alpha2: &Alpha2, records: &mut Vec<CanonicalRecord>) {
        for entry in self.entries.iter().filter(|e| &e.country == alpha2) {
            apply_one(&entry.op, records);
        }
    }
}

fn apply_one(op: &ManualOverride, records: &mut Vec<CanonicalRecord>) {
    match op {
        ManualOverride::Add { record } => records.push(record.clone()),
        ManualOverride::Delete { date, change } => {
            let before = records.len();
            records.retain(|r| !matches_key(r, *date, change.as_deref()));
            debug!(removed = before - records.len(), %date, "override delete");
        }
        ManualOverride::SetField {
            date,
            change,
            field,
            value,
        } => {
            if value.is_empty() {
                return;
            }
            for rec in records
                .iter_mut()
                .filter(|r| matches_key(r, *date, change.as_deref()))
            {
                set_field(rec, *field, value);
            }
        }
    }
}

fn matches_key(rec: &CanonicalRecord, date: NaiveDate, change: Option<&str>) -> bool {
    rec.date_issued.primary == date
        && change.map_or(true, |c| rec.change.to_lowercase() == c.to_lowercase())
}

fn set_field(rec: &mut CanonicalRecord, field: Field, value: &str) {
    match field {
        Field::Change => rec.change = value.to_string(),
        Field::DescriptionOfChange => rec.description_of_change = value.to_string(),
        Field::Source => rec.source = value.to_string(),
        Field::DateIssued => {
            // A date value that fails to parse leaves the record untouched;
            // the override table is patching data, not breaking it.
            if let Ok(ann) = dates::parse_annotated(value) {
                rec.date_issued = ann;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DateAnnotation;

    fn a2(s: &str) -> Alpha2 {
        s.parse().unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn rec(change: &str, date: &str) -> CanonicalRecord {
        CanonicalRecord {
            change: change.into(),
            description_of_change: String::new(),
            date_issued: DateAnnotation::new(d(date)),
            source: "OBP.".into(),
        }
    }

    fn table(entries: Vec<OverrideEntry>) -> OverrideTable {
        OverrideTable {
            version: 1,
            entries,
        }
    }

    #[test]
    fn delete_removes_all_date_matches() {
        let t = table(vec![OverrideEntry {
            country: a2("GB"),
            op: ManualOverride::Delete {
                date: d("2014-10-30"),
                change: None,
            },
        }]);
        let mut recs = vec![
            rec("Bogus.", "2014-10-30"),
            rec("Bogus twin.", "2014-10-30"),
            rec("Real.", "2013-01-01"),
        ];
        t.apply(&a2("GB"), &mut recs);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].change, "Real.");
    }

    #[test]
    fn delete_with_change_key_is_exact() {
        let t = table(vec![OverrideEntry {
            country: a2("FR"),
            op: ManualOverride::Delete {
                date: d("2016-11-15"),
                change: Some("addition of regions.".into()),
            },
        }]);
        let mut recs = vec![
            rec("Addition of regions.", "2016-11-15"),
            rec("Other change.", "2016-11-15"),
        ];
        t.apply(&a2("FR"), &mut recs);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].change, "Other change.");
    }

    #[test]
    fn set_field_overwrites_named_field_only() {
        let t = table(vec![OverrideEntry {
            country: a2("AZ"),
            op: ManualOverride::SetField {
                date: d("2011-12-13"),
                change: None,
                field: Field::DateIssued,
                value: "2011-12-13 (corrected 2011-12-15)".into(),
            },
        }]);
        let mut recs = vec![rec("Subdivisions added.", "2011-12-13")];
        t.apply(&a2("AZ"), &mut recs);
        assert_eq!(
            recs[0].date_issued.to_string(),
            "2011-12-13 (corrected 2011-12-15)"
        );
        assert_eq!(recs[0].change, "Subdivisions added.");
    }

    #[test]
    fn set_field_with_empty_value_is_a_no_op() {
        let t = table(vec![OverrideEntry {
            country: a2("AZ"),
            op: ManualOverride::SetField {
                date: d("2011-12-13"),
                change: None,
                field: Field::Source,
                value: String::new(),
            },
        }]);
        let mut recs = vec![rec("Subdivisions added.", "2011-12-13")];
        t.apply(&a2("AZ"), &mut recs);
        assert_eq!(recs[0].source, "OBP.");
    }

    #[test]
    fn add_appends_verbatim() {
        let added = rec("Manually recovered change.", "2009-02-17");
        let t = table(vec![OverrideEntry {
            country: a2("MD"),
            op: ManualOverride::Add {
                record: added.clone(),
            },
        }]);
        let mut recs = vec![];
        t.apply(&a2("MD"), &mut recs);
        assert_eq!(recs, vec![added]);
    }

    #[test]
    fn entries_for_other_countries_are_ignored() {
        let t = table(vec![OverrideEntry {
            country: a2("XK"),
            op: ManualOverride::Delete {
                date: d("2014-10-30"),
                change: None,
            },
        }]);
        let mut recs = vec![rec("Keep me.", "2014-10-30")];
        t.apply(&a2("GB"), &mut recs);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn builtin_table_parses() {
        assert!(!OverrideTable::builtin().is_empty());
    }
}

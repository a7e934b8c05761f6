// src/extract/assemble.rs
//
// Builds one canonical record per matrix data row, applying the
// field-presence heuristics the two sources need.

use tracing::debug;

use super::{columns, dates};
use crate::error::{Error, Result};
use crate::records::{Alpha2, CanonicalRecord};

/// Placeholder some OBP entries carry instead of a change summary.
const TBD: &str = "(TBD)";

/// Assemble records from a flattened matrix. Row 0 is the header row and is
/// mapped to the canonical schema first. A date cell that fails to parse is
/// fatal for the whole table: it means the structure was not the one we
/// recognized, so partial output would be garbage.
pub fn assemble_records(
    alpha2: &Alpha2,
    matrix: &[Vec<Option<String>>],
) -> Result<Vec<CanonicalRecord>> {
    let Some((header, data)) = matrix.split_first() else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = header
        .iter()
        .map(|c| c.clone().unwrap_or_default())
        .collect();
    let mapped = columns::map_headers(&headers);

    let col = |name: &str| mapped.iter().position(|h| h == name);
    let change_col = col(columns::CHANGE);
    let desc_col = col(columns::DESCRIPTION);
    let source_col = col(columns::SOURCE);
    let date_col = col(columns::DATE_ISSUED)
        .ok_or_else(|| Error::DateFormat(headers.join(" | ")))?;

    let mut out = Vec::with_capacity(data.len());
    for row in data {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .and_then(|c| c.as_deref())
                .map(collapse_spacing)
                .unwrap_or_default()
        };

        let date_text = cell(Some(date_col));
        let date_issued = dates::parse_annotated(date_text.trim_end_matches('.'))?;

        let mut change = cell(change_col);
        let mut description_of_change = cell(desc_col);
        let mut source = cell(source_col);

        // OBP rows often leave the change column blank or stubbed; the
        // description is the real content then.
        if change.is_empty() || change.trim_end_matches('.') == TBD {
            change = std::mem::take(&mut description_of_change);
        }
        if change.is_empty() && description_of_change.is_empty() {
            debug!(country = %alpha2, date = %date_issued, "dropping empty row");
            continue;
        }
        if source.is_empty() {
            source = default_source(alpha2);
        }

        out.push(CanonicalRecord {
            change,
            description_of_change,
            date_issued,
            source,
        });
    }

    Ok(out)
}

/// Reference used when a row names no source of its own.
pub fn default_source(alpha2: &Alpha2) -> String {
    format!(
        "ISO Online Browsing Platform (OBP) - https://www.iso.org/obp/ui/#iso:code:3166:{}",
        alpha2
    )
}

fn collapse_spacing(text: &str) -> String {
    let mut out = text.trim().to_string();
    while out.contains("  ") {
        out = out.replace("  ", " ");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a2(s: &str) -> Alpha2 {
        s.parse().unwrap()
    }

    fn matrix(rows: &[&[&str]]) -> Vec<Vec<Option<String>>> {
        rows.iter()
            .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
            .collect()
    }

    #[test]
    fn assembles_canonical_row() {
        let m = matrix(&[
            &["Code/Subdivision change", "Description of change in newsletter", "Effective date of change", "Newsletter"],
            &["Subdivisions added: AZ-KAN Kǝngǝrli.", "Alphabetical re-ordering.", "2011-12-13 (corrected 2011-12-15)", "Newsletter II-3 - https://www.iso.org/newsletter"],
        ]);
        let recs = assemble_records(&a2("AZ"), &m).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].change, "Subdivisions added: AZ-KAN Kǝngǝrli.");
        assert_eq!(recs[0].description_of_change, "Alphabetical re-ordering.");
        assert_eq!(
            recs[0].date_issued.to_string(),
            "2011-12-13 (corrected 2011-12-15)"
        );
    }

    #[test]
    fn empty_change_promotes_description() {
        let m = matrix(&[
            &["Change", "Description of change", "Date Issued", "Source"],
            &["", "Addition of 2 regions.", "2016-11-15", "OBP."],
        ]);
        let recs = assemble_records(&a2("FR"), &m).unwrap();
        assert_eq!(recs[0].change, "Addition of 2 regions.");
        assert_eq!(recs[0].description_of_change, "");
    }

    #[test]
    fn tbd_placeholder_promotes_description() {
        let m = matrix(&[
            &["Change", "Description of change", "Date Issued", "Source"],
            &["(TBD).", "Correction of spelling.", "2020-03-02", "OBP."],
        ]);
        let recs = assemble_records(&a2("DE"), &m).unwrap();
        assert_eq!(recs[0].change, "Correction of spelling.");
    }

    #[test]
    fn empty_source_is_synthesized() {
        let m = matrix(&[
            &["Change", "Description of change", "Date Issued", "Source"],
            &["Update List Source.", "", "2015-11-27", ""],
        ]);
        let recs = assemble_records(&a2("ba"), &m).unwrap();
        assert_eq!(
            recs[0].source,
            "ISO Online Browsing Platform (OBP) - https://www.iso.org/obp/ui/#iso:code:3166:BA"
        );
    }

    #[test]
    fn rows_with_no_content_are_dropped() {
        let m = matrix(&[
            &["Change", "Description of change", "Date Issued", "Source"],
            &["", "", "2014-10-30", "OBP."],
            &["Real change.", "", "2014-10-29", "OBP."],
        ]);
        let recs = assemble_records(&a2("GB"), &m).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].change, "Real change.");
    }

    #[test]
    fn bad_date_is_fatal_for_the_table() {
        let m = matrix(&[
            &["Change", "Description of change", "Date Issued", "Source"],
            &["Something.", "", "not a date", "OBP."],
        ]);
        assert!(matches!(
            assemble_records(&a2("GB"), &m),
            Err(Error::DateFormat(_))
        ));
    }

    #[test]
    fn double_spacing_is_collapsed() {
        let m = matrix(&[
            &["Change", "Description of change", "Date Issued", "Source"],
            &["Spelling  corrected  twice.", "", "2004-03-08", "OBP."],
        ]);
        let recs = assemble_records(&a2("ES"), &m).unwrap();
        assert_eq!(recs[0].change, "Spelling corrected twice.");
    }

    #[test]
    fn empty_matrix_is_empty_output() {
        assert!(assemble_records(&a2("FR"), &[]).unwrap().is_empty());
    }
}

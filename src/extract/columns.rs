// src/extract/columns.rs
//
// Maps the source-specific header spellings onto the canonical schema.
// Entries are ordered most-specific first; lookup is case-insensitive with
// trailing periods stripped.

pub const CHANGE: &str = "Change";
pub const DESCRIPTION: &str = "Description of Change";
pub const DATE_ISSUED: &str = "Date Issued";
pub const SOURCE: &str = "Source";

/// Synonym table. Longer spellings sit above their prefixes so that e.g.
/// "Description of change in newsletter" never matches a looser entry.
static SYNONYMS: &[(&str, &str)] = &[
    ("description of change in newsletter", DESCRIPTION),
    ("description of change", DESCRIPTION),
    ("code/subdivision change", CHANGE),
    ("effective date of change", DATE_ISSUED),
    ("effective date", DATE_ISSUED),
    ("date of change", DATE_ISSUED),
    ("publication date", DATE_ISSUED),
    ("date issued", DATE_ISSUED),
    ("newsletter/obp", SOURCE),
    ("newsletter", SOURCE),
    ("source", SOURCE),
    ("change", CHANGE),
];

/// Rename each header to its canonical name; unmatched headers pass
/// through unchanged. Empty input yields empty output.
pub fn map_headers(headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| {
            let key = h.trim().trim_end_matches('.').to_lowercase();
            SYNONYMS
                .iter()
                .find(|(syn, _)| *syn == key)
                .map(|(_, canon)| canon.to_string())
                .unwrap_or_else(|| h.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn maps_wiki_and_obp_spellings() {
        let mapped = map_headers(&owned(&[
            "Code/Subdivision change",
            "Description of change in newsletter",
            "Effective date of change",
            "Newsletter",
        ]));
        assert_eq!(mapped, owned(&[CHANGE, DESCRIPTION, DATE_ISSUED, SOURCE]));
    }

    #[test]
    fn lookup_ignores_case_and_trailing_period() {
        let mapped = map_headers(&owned(&["Date issued.", "SOURCE", "change"]));
        assert_eq!(mapped, owned(&[DATE_ISSUED, SOURCE, CHANGE]));
    }

    #[test]
    fn specific_entries_win_over_loose_ones() {
        let mapped = map_headers(&owned(&["Description of change"]));
        assert_eq!(mapped, owned(&[DESCRIPTION]));
    }

    #[test]
    fn unmatched_headers_pass_through() {
        let mapped = map_headers(&owned(&["Remarks"]));
        assert_eq!(mapped, owned(&["Remarks"]));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(map_headers(&[]).is_empty());
    }
}

// src/extract/mod.rs
//
// Per-country extraction pipeline: locate the change-history tables in each
// source page, flatten them, map columns, assemble records, then merge the
// two sources into one deduplicated list. Each country is a pure function
// of its two input documents, so the fan-out runs on rayon with no shared
// mutable state.

pub mod assemble;
pub mod columns;
pub mod dates;
pub mod flatten;
pub mod merge;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::fetch::CountryPages;
use crate::records::{Alpha2, CanonicalRecord};

/// Extract and merge one country's records from its two source pages.
#[instrument(level = "info", skip(pages), fields(country = %pages.alpha2))]
pub fn extract_country(pages: &CountryPages) -> Result<Vec<CanonicalRecord>> {
    let from_wiki = source_records(&pages.alpha2, &pages.wiki_html)?;
    let from_obp = source_records(&pages.alpha2, &pages.obp_html)?;
    info!(
        wiki = from_wiki.len(),
        obp = from_obp.len(),
        "source extraction complete"
    );
    Ok(merge::merge_sources(from_wiki, from_obp))
}

/// Extract every record from one source document. A page without a changes
/// section contributes nothing; a table whose dates cannot be read aborts
/// the whole source.
pub fn source_records(alpha2: &Alpha2, html: &str) -> Result<Vec<CanonicalRecord>> {
    let doc = Html::parse_document(html);
    let mut records = Vec::new();
    for table in changes_tables(&doc) {
        let matrix = flatten::flatten_table(&doc, Some(table))?;
        records.extend(assemble::assemble_records(alpha2, &matrix)?);
    }
    Ok(records)
}

/// The change-history tables of a document: those between the "Changes"
/// heading and the next heading. A page without that section has no
/// change tables — an empty result, not an error.
fn changes_tables(doc: &Html) -> Vec<ElementRef<'_>> {
    static ANY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("*").expect("valid selector"));

    let mut tables = Vec::new();
    let mut armed = false;
    for el in doc.select(&ANY_SEL) {
        if el.value().attr("id") == Some("Changes") {
            armed = true;
            continue;
        }
        if !armed {
            continue;
        }
        match el.value().name() {
            "table" => tables.push(el),
            "h2" | "h3" => break,
            _ => {}
        }
    }
    tables
}

/// Extract all countries in parallel. Failures abort only their own
/// country; they are logged and skipped so a single malformed page cannot
/// sink the batch.
pub fn extract_all(pages: &[CountryPages]) -> BTreeMap<Alpha2, Vec<CanonicalRecord>> {
    pages
        .par_iter()
        .filter_map(|p| match extract_country(p) {
            Ok(records) => Some((p.alpha2.clone(), records)),
            Err(e) => {
                warn!(country = %p.alpha2, error = %e, "skipping country");
                None
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

// src/query/mod.rs
//
// Stateless filters over an already-built record store. Errors come back
// synchronously and never partially apply; "no matches" is an empty map,
// not an error.

pub mod range;
pub mod search;
pub mod year;

use std::collections::BTreeMap;

use crate::error::Result;
use crate::records::{Alpha2, CanonicalRecord};
use crate::store::RecordStore;

pub use range::DateRange;
pub use search::{search, SearchHit};
pub use year::YearExpr;

/// Keep the records whose nominal year (primary date only) satisfies the
/// year expression. Countries with no surviving records are omitted.
pub fn by_year(store: &RecordStore, expr: &str) -> Result<BTreeMap<Alpha2, Vec<CanonicalRecord>>> {
    let expr: YearExpr = expr.parse()?;
    Ok(filter(store, |r| expr.matches(r.date_issued.year())))
}

/// Keep the records whose primary or corrected date falls inside the
/// inclusive range.
pub fn by_date_range(
    store: &RecordStore,
    range_text: &str,
) -> Result<BTreeMap<Alpha2, Vec<CanonicalRecord>>> {
    let range = DateRange::parse(range_text)?;
    Ok(filter(store, |r| range.contains(&r.date_issued)))
}

fn filter(
    store: &RecordStore,
    keep: impl Fn(&CanonicalRecord) -> bool,
) -> BTreeMap<Alpha2, Vec<CanonicalRecord>> {
    store
        .iter()
        .filter_map(|(alpha2, records)| {
            let kept: Vec<CanonicalRecord> = records.iter().filter(|r| keep(r)).cloned().collect();
            (!kept.is_empty()).then(|| (alpha2.clone(), kept))
        })
        .collect()
}

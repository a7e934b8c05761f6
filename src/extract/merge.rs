// src/extract/merge.rs
//
// Combines the two sources' record lists for one country. The sources
// often publish the same change with slightly different field population,
// so duplicates are resolved by a completeness score, with corrected-date
// variants preferred when the literal dates collide.

use std::collections::HashMap;
use std::collections::HashSet;

use tracing::debug;

use crate::records::CanonicalRecord;

/// Merge source A's records with source B's and deduplicate. Output order
/// is unspecified beyond first-seen stability; the store sorts afterwards.
pub fn merge_sources(
    source_a: Vec<CanonicalRecord>,
    source_b: Vec<CanonicalRecord>,
) -> Vec<CanonicalRecord> {
    let mut combined = source_a;
    combined.extend(source_b);
    let first = dedup_by_keys(combined);
    dedup_by_shared_date(first)
}

/// First pass: group under three progressively looser keys and keep, per
/// key, only the most complete record. Surviving any key's winning slot is
/// enough to be retained.
fn dedup_by_keys(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let key_fns: [fn(&CanonicalRecord) -> String; 3] = [
        |r| {
            format!(
                "{}\u{1f}{}\u{1f}{}",
                r.change.to_lowercase(),
                r.description_of_change.to_lowercase(),
                r.date_issued
            )
        },
        |r| format!("{}\u{1f}{}", r.change.to_lowercase(), r.date_issued),
        |r| {
            format!(
                "{}\u{1f}{}",
                r.description_of_change.to_lowercase(),
                r.date_issued
            )
        },
    ];

    let mut winners: HashSet<usize> = HashSet::new();
    for key_of in key_fns {
        let mut best: HashMap<String, usize> = HashMap::new();
        for (i, rec) in records.iter().enumerate() {
            let key = key_of(rec);
            match best.get(&key) {
                Some(&j) if records[j].completeness() >= rec.completeness() => {}
                _ => {
                    best.insert(key, i);
                }
            }
        }
        winners.extend(best.values().copied());
    }

    let dropped = records.len() - winners.len();
    if dropped > 0 {
        debug!(dropped, "key dedup removed duplicate records");
    }
    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| winners.contains(i))
        .map(|(_, r)| r)
        .collect()
}

/// Second pass: any two records sharing a literal date (primary or
/// corrected) are the same change seen twice. Prefer the variant carrying
/// a corrected date, then the strictly more complete one, then first-seen.
fn dedup_by_shared_date(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut kept: Vec<Option<CanonicalRecord>> = Vec::new();
    let mut by_date: HashMap<String, usize> = HashMap::new();

    for rec in records {
        let dates = rec.date_issued.literal_dates();
        let clash = dates.iter().find_map(|d| by_date.get(d).copied());

        match clash {
            None => {
                let slot = kept.len();
                for d in dates {
                    by_date.insert(d, slot);
                }
                kept.push(Some(rec));
            }
            Some(slot) => {
                let incumbent = kept[slot].as_ref().expect("slot holds a live record");
                if prefer_challenger(incumbent, &rec) {
                    // Drop the evicted record's date keys so a later record
                    // sharing only those dates is not pulled into this slot.
                    for d in incumbent.date_issued.literal_dates() {
                        if by_date.get(&d) == Some(&slot) {
                            by_date.remove(&d);
                        }
                    }
                    for d in rec.date_issued.literal_dates() {
                        by_date.insert(d, slot);
                    }
                    kept[slot] = Some(rec);
                }
            }
        }
    }

    kept.into_iter().flatten().collect()
}

fn prefer_challenger(incumbent: &CanonicalRecord, challenger: &CanonicalRecord) -> bool {
    match (
        incumbent.date_issued.corrected.is_some(),
        challenger.date_issued.corrected.is_some(),
    ) {
        (false, true) => true,
        (true, false) => false,
        // Both or neither corrected: strictly more complete wins, ties
        // keep the incumbent (first-seen).
        _ => challenger.completeness() > incumbent.completeness(),
    }
}

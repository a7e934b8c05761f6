// src/store/mod.rs
//
// The per-country record store: built once per extraction run, then
// read-only for the query engine's lifetime. Always sorted by primary
// issue date descending, ties in encounter order.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::overrides::OverrideTable;
use crate::records::{Alpha2, CanonicalRecord};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RecordStore {
    countries: BTreeMap<Alpha2, Vec<CanonicalRecord>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one country's merged records, establishing the sort invariant.
    pub fn insert_country(&mut self, alpha2: Alpha2, mut records: Vec<CanonicalRecord>) {
        sort_records(&mut records);
        self.countries.insert(alpha2, records);
    }

    pub fn get(&self, alpha2: &Alpha2) -> Option<&[CanonicalRecord]> {
        self.countries.get(alpha2).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Alpha2, &[CanonicalRecord])> {
        self.countries.iter().map(|(a, r)| (a, r.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.countries.values().map(Vec::len).sum()
    }

    /// Run the manual override table over every country present, in the
    /// table's declared order, then restore the sort invariant. Entries for
    /// countries outside this run are ignored.
    pub fn apply_overrides(&mut self, table: &OverrideTable) {
        for (alpha2, records) in self.countries.iter_mut() {
            table.apply(alpha2, records);
            sort_records(records);
        }
    }

    /// Incremental custom update: append one record to a country, keeping
    /// the sort invariant. Creates the country if absent.
    pub fn add_record(&mut self, alpha2: Alpha2, record: CanonicalRecord) {
        let records = self.countries.entry(alpha2).or_default();
        records.push(record);
        sort_records(records);
    }

    /// Incremental custom update: delete records matching the date key
    /// (and optional change text). Returns the number removed.
    pub fn delete_matching(
        &mut self,
        alpha2: &Alpha2,
        date: NaiveDate,
        change: Option<&str>,
    ) -> usize {
        let Some(records) = self.countries.get_mut(alpha2) else {
            return 0;
        };
        let before = records.len();
        records.retain(|r| {
            r.date_issued.primary != date
                || change.map_or(false, |c| r.change.to_lowercase() != c.to_lowercase())
        });
        before - records.len()
    }

    /// Load a persisted snapshot. No implicit global state: the returned
    /// value owns everything.
    pub fn load(path: impl AsRef<Path>) -> Result<RecordStore> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let mut store: RecordStore = serde_json::from_str(&raw)
            .with_context(|| format!("parsing snapshot {}", path.display()))?;
        // Snapshots written by older runs may predate the sort invariant.
        for records in store.countries.values_mut() {
            sort_records(records);
        }
        Ok(store)
    }

    /// Persist the store as a JSON snapshot, written to a temp file and
    /// renamed into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        let file = File::create(&tmp)
            .with_context(|| format!("creating snapshot temp file {}", tmp.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .context("serializing record store")?;
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
        info!(
            countries = self.len(),
            records = self.record_count(),
            path = %path.display(),
            "snapshot saved"
        );
        Ok(())
    }
}

fn sort_records(records: &mut [CanonicalRecord]) {
    // Stable: equal primary dates keep encounter order (source A before B).
    records.sort_by(|a, b| b.date_issued.primary.cmp(&a.date_issued.primary));
}

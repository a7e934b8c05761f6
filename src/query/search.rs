// src/query/search.rs
//
// Fuzzy free-text search over the record store. An exact word-boundary hit
// scores 100; otherwise the best token-level similarity ratio decides
// whether the record clears the likeness threshold.

use rapidfuzz::fuzz;
use regex::RegexBuilder;

use crate::extract::dates;
use crate::records::{Alpha2, CanonicalRecord};
use crate::store::RecordStore;

/// One search result. Hits sort by score descending, ties in
/// country-code order.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub alpha2: Alpha2,
    pub score: u8,
    pub record: CanonicalRecord,
}

/// Search every country for the comma-separated `terms`. `likeness` is the
/// 1-100 similarity threshold; 100 keeps exact matches only.
pub fn search(store: &RecordStore, terms: &str, likeness: u8) -> Vec<SearchHit> {
    let likeness = likeness.clamp(1, 100);
    let terms: Vec<Term> = terms
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(Term::new)
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for (alpha2, records) in store.iter() {
        for record in records {
            let best = terms
                .iter()
                .filter_map(|t| t.score(record, likeness))
                .max();
            if let Some(score) = best {
                hits.push(SearchHit {
                    alpha2: alpha2.clone(),
                    score,
                    record: record.clone(),
                });
            }
        }
    }

    // Stable sort: equal scores keep country-code order from the store.
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits
}

struct Term {
    /// Date terms are canonicalized so any accepted input format matches
    /// the stored display text.
    text: String,
    is_date: bool,
    word_re: regex::Regex,
}

impl Term {
    fn new(raw: &str) -> Term {
        let (text, is_date) = match dates::parse_date(raw) {
            Ok(d) => (d.to_string(), true),
            Err(_) => (raw.to_string(), false),
        };
        let word_re = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(&text)))
            .case_insensitive(true)
            .build()
            .expect("escaped term is a valid regex");
        Term {
            text,
            is_date,
            word_re,
        }
    }

    fn score(&self, record: &CanonicalRecord, likeness: u8) -> Option<u8> {
        let mut space = format!("{} {}", record.change, record.description_of_change);
        if self.is_date {
            space.push(' ');
            space.push_str(&record.date_issued.to_string());
        }

        if self.word_re.is_match(&space) {
            return Some(100);
        }

        let needle = self.text.to_lowercase();
        let best = space
            .split_whitespace()
            .map(|token| {
                let token = token
                    .trim_matches(|c: char| c.is_ascii_punctuation())
                    .to_lowercase();
                // rapidfuzz returns a normalized 0..=1 similarity; scale
                // to the 1..=100 likeness range before comparing.
                fuzz::ratio(token.chars(), needle.chars()) * 100.0
            })
            .fold(0.0f64, f64::max);

        (best >= likeness as f64).then_some(best.round() as u8)
    }
}

// src/error.rs

use thiserror::Error;

/// Core error taxonomy. Extraction-time errors abort only the owning
/// country's run; query-time errors are returned synchronously and never
/// partially apply a filter. An empty result set is never an error.
#[derive(Debug, Error)]
pub enum Error {
    /// The flattener was handed something other than a `<table>` element.
    #[error("expected a <table> element, got <{0}>")]
    MalformedTable(String),

    /// Unrecognised date text. Fatal for the owning table: a date cell the
    /// normalizer cannot read means the table structure itself was not the
    /// one we expected.
    #[error("unrecognised date text: {0:?}")]
    DateFormat(String),

    /// Input could not be resolved to an ISO 3166-1 alpha-2 code.
    #[error("cannot resolve {0:?} to an ISO 3166-1 alpha-2 code")]
    InvalidAlphaCode(String),

    /// Year expression failed to parse (mixed symbols, bad year token).
    #[error("invalid year expression {expr:?}: {reason}")]
    InvalidYearExpression { expr: String, reason: String },

    /// Query-time date string was not `YYYY-MM-DD`.
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDateFormat(String),

    /// Page fetch failed; surfaced unmodified from the HTTP layer.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

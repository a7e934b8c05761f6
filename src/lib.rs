// src/lib.rs
//
// isoscraper turns the ISO 3166-2 change-history tables published by two
// independent sources per country into a canonical, deduplicated record
// store, and serves year / date-range / free-text queries over it.

pub mod error;
pub mod extract;
pub mod fetch;
pub mod overrides;
pub mod query;
pub mod records;
pub mod store;

pub use error::{Error, Result};
pub use records::{Alpha2, CanonicalRecord, DateAnnotation};
pub use store::RecordStore;

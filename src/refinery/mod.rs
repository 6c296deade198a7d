// * The Refinery: normalization of raw collector records
// * Id extraction, counter parsing, relative-date resolution, region filter, dedup.

pub mod dates;
pub mod fields;
pub mod normalizer;
pub mod regions;

// * Re-exports for convenient access
pub use dates::{process_time, PostedAt};
pub use fields::{extract_id, process_numbers};
pub use normalizer::{normalize_note, normalize_notes, run, NormalizeStats};
pub use regions::{is_domestic, DOMESTIC_REGIONS};

use thiserror::Error;

use crate::persistence::StoreError;

#[derive(Debug, Error)]
pub enum RefineryError {
    #[error("Malformed counter value: {0:?}")]
    InvalidNumber(String),

    #[error("Unresolvable note time: {0:?}")]
    InvalidDate(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

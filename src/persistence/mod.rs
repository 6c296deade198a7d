// * Persistence: record schema and the file formats passed between stages

pub mod schema;
pub mod store;

// * Re-exports for convenient access
pub use schema::{CorpusDoc, Note, RawNote, TokenizedNote, CSV_HEADER, ZERO_COUNT};
pub use store::{
    ensure_parent, read_jsonl, write_jsonl, CsvTable, JsonlAppender, JsonlReader, StoreError,
};

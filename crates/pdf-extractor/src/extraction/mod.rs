//! Structured extraction: LLM prompt, chunk merging, CSV flattening

pub mod flatten;
pub mod merge;
mod pipeline;
pub mod prompt;

pub use flatten::flatten_for_csv;
pub use merge::{chunk_envelope, merge_chunks};
pub use pipeline::{ExtractionPipeline, TEXT_TOO_SHORT_MESSAGE};

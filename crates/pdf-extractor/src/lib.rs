//! pdf-extractor: PDF to structured JSON extraction service
//!
//! Uploaded PDFs are converted to text, sent to an OpenAI-compatible chat
//! completion API for verbatim structured extraction, flattened for CSV export
//! and persisted in SQLite. Batches go through an in-memory single-worker queue.

pub mod config;
pub mod error;
pub mod export;
pub mod extraction;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use extraction::ExtractionPipeline;
pub use processing::{JobStatus, QueueStatus, UploadQueue};
pub use server::ExtractorServer;
pub use storage::RecordStore;
pub use types::{ExtractedRecord, FlatContent, UploadedFile};

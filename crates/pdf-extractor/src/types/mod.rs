//! Core types for the extraction service

pub mod record;
pub mod response;
pub mod upload;

pub use record::{ExtractedRecord, FlatContent, MAX_FILE_NAME_CHARS};
pub use response::BatchUploadResponse;
pub use upload::{repair_file_name, UploadedFile, PDF_MIME_TYPE};

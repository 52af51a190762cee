//! Uploaded files as received from multipart requests

use bytes::Bytes;

/// MIME type every upload must carry
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A file taken off a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name
    pub file_name: String,
    /// Client-supplied content type, if any
    pub content_type: Option<String>,
    /// Raw file bytes
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name: repair_file_name(&file_name.into()),
            content_type,
            data,
        }
    }

    /// Whether the declared content type is `application/pdf`
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some(PDF_MIME_TYPE)
    }
}

/// Undo latin1 mis-decoding of UTF-8 file names ("MÃ¼nchen.pdf" -> "München.pdf").
///
/// Only applies when every char fits in one byte and the bytes form valid
/// UTF-8 that differs from the input. Best effort: a genuine latin1 name that
/// happens to be valid UTF-8 when reinterpreted will be rewritten too.
pub fn repair_file_name(name: &str) -> String {
    if name.is_ascii() || name.chars().any(|c| c as u32 > 0xFF) {
        return name.to_string();
    }

    let bytes: Vec<u8> = name.chars().map(|c| c as u32 as u8).collect();
    match String::from_utf8(bytes) {
        Ok(decoded) if decoded != name => decoded,
        _ => name.to_string(),
    }
}

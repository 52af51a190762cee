//! Error types for the extraction service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message used when an extraction failed because something timed out
pub const TIMEOUT_MESSAGE: &str = "PDF processing timeout - file may be too large";

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad upload, bad batch, unknown job id
    #[error("{0}")]
    Validation(String),

    /// Record not found
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid session
    #[error("{0}")]
    Unauthorized(String),

    /// Document could not be turned into structured data
    #[error("{message}")]
    Extraction { message: String, timed_out: bool },

    /// PDF text extraction error
    #[error("Failed to parse PDF '{filename}': {message}")]
    PdfParse { filename: String, message: String },

    /// LLM call error
    #[error("LLM error: {0}")]
    Llm(String),

    /// An operation exceeded its time budget
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Record store error
    #[error("Database error: {0}")]
    Persistence(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a PDF parse error
    pub fn pdf_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PdfParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error was caused by a timeout anywhere in the chain
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Extraction { timed_out, .. } => *timed_out,
            Error::Http(err) => err.is_timeout(),
            Error::PdfParse { message, .. } => message.to_lowercase().contains("timeout"),
            other => other.to_string().to_lowercase().contains("timeout"),
        }
    }

    /// Wrap a pipeline failure into the extraction failure surfaced to callers.
    ///
    /// Persistence errors pass through unchanged, and an error that is
    /// already an extraction failure is not wrapped twice.
    pub fn into_extraction_failure(self) -> Self {
        match self {
            Error::Persistence(_) | Error::Extraction { .. } => self,
            other if other.is_timeout() => Error::Extraction {
                message: TIMEOUT_MESSAGE.to_string(),
                timed_out: true,
            },
            other => Error::Extraction {
                message: format!("Failed to extract data from PDF: {}", other.detail()),
                timed_out: false,
            },
        }
    }

    /// Inner message without the variant prefix where one exists
    fn detail(&self) -> String {
        match self {
            Error::PdfParse { message, .. } => message.clone(),
            Error::Llm(msg) | Error::Internal(msg) | Error::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            Error::Extraction { message, timed_out } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                if *timed_out { "extraction_timeout" } else { "extraction_error" },
                message.clone(),
            ),
            Error::PdfParse { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "parse_error", self.to_string())
            }
            Error::Llm(msg) => (StatusCode::BAD_GATEWAY, "llm_error", msg.clone()),
            Error::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "timeout", msg.clone()),
            Error::Persistence(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error", msg.clone())
            }
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (
                StatusCode::BAD_GATEWAY,
                "http_error",
                err.to_string(),
            ),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        if status.is_server_error() {
            tracing::error!("{} ({}): {}", status, error_type, message);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_generic_failure() {
        let err = Error::llm("No content received from the model").into_extraction_failure();
        match err {
            Error::Extraction { message, timed_out } => {
                assert!(!timed_out);
                assert_eq!(
                    message,
                    "Failed to extract data from PDF: No content received from the model"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wraps_timeout_distinctly() {
        let err = Error::Timeout("LLM call exceeded 120s".to_string()).into_extraction_failure();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_persistence_passes_through() {
        let err = Error::persistence("disk full").into_extraction_failure();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::validation("Only PDF files are allowed").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("Data not found".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Unauthorized("no session".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}

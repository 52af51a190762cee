//! Persisted extraction records

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Longest file name the record store keeps, in characters
pub const MAX_FILE_NAME_CHARS: usize = 500;

/// Flat, CSV-ready mapping produced by the flattener.
///
/// Values are strings, numbers or booleans; never arrays, objects or null.
pub type FlatContent = Map<String, Value>;

/// One successful extraction, as stored in the `extracted_data` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    /// Unique record ID
    pub id: Uuid,
    /// Original upload name (after best-effort encoding repair)
    pub file_name: String,
    /// Flattened extraction result
    pub extracted_content: FlatContent,
    /// Creation time, the listing sort key
    pub created_at: DateTime<Utc>,
}

impl ExtractedRecord {
    /// Create a new record stamped with the current time.
    ///
    /// The timestamp is truncated to microseconds, the precision the store keeps.
    pub fn new(file_name: impl Into<String>, extracted_content: FlatContent) -> Self {
        let file_name: String = file_name.into();
        let file_name = if file_name.chars().count() > MAX_FILE_NAME_CHARS {
            file_name.chars().take(MAX_FILE_NAME_CHARS).collect()
        } else {
            file_name
        };

        Self {
            id: Uuid::new_v4(),
            file_name,
            extracted_content,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

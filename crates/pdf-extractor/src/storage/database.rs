//! SQLite record store for extraction results

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{ExtractedRecord, FlatContent};

/// Raw `extracted_data` row before conversion
type RawRow = (String, String, String, String);

const SELECT_COLUMNS: &str =
    r#"SELECT id, "fileName", "extractedContent", "createdAt" FROM extracted_data"#;

/// SQLite-backed store for `ExtractedRecord`s
#[derive(Clone)]
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::persistence(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::persistence(format!("Failed to open database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate(true)?;
        tracing::info!("Record store opened at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory database (for tests and ephemeral runs)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            Error::persistence(format!("Failed to open in-memory database: {}", e))
        })?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate(false)?;
        Ok(store)
    }

    /// Create the schema if it does not exist
    fn migrate(&self, on_disk: bool) -> Result<()> {
        let conn = self.conn.lock();

        if on_disk {
            conn.execute_batch(
                r#"
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                "#,
            )
            .map_err(|e| Error::persistence(format!("Failed to set pragmas: {}", e)))?;
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS extracted_data (
                id TEXT PRIMARY KEY,
                "fileName" TEXT NOT NULL CHECK (length("fileName") <= 500),
                "extractedContent" TEXT NOT NULL,
                "createdAt" TEXT NOT NULL
                    DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z', 'now'))
            );

            CREATE INDEX IF NOT EXISTS idx_extracted_data_created_at
                ON extracted_data("createdAt");
            "#,
        )
        .map_err(|e| Error::persistence(format!("Failed to run migrations: {}", e)))?;

        tracing::debug!("Record store migrations complete");
        Ok(())
    }

    /// Insert a new record as a single row
    pub fn insert(&self, record: &ExtractedRecord) -> Result<()> {
        let content = serde_json::to_string(&record.extracted_content)?;
        let conn = self.conn.lock();

        conn.execute(
            r#"INSERT INTO extracted_data (id, "fileName", "extractedContent", "createdAt")
               VALUES (?1, ?2, ?3, ?4)"#,
            params![
                record.id.to_string(),
                record.file_name,
                content,
                format_timestamp(&record.created_at),
            ],
        )
        .map_err(|e| Error::persistence(format!("Failed to insert record: {}", e)))?;

        tracing::debug!("Stored record {} for '{}'", record.id, record.file_name);
        Ok(())
    }

    /// All records, newest first
    pub fn list(&self) -> Result<Vec<ExtractedRecord>> {
        let rows: Vec<RawRow> = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(&format!(
                    r#"{} ORDER BY "createdAt" DESC, rowid DESC"#,
                    SELECT_COLUMNS
                ))
                .map_err(|e| Error::persistence(format!("Failed to prepare query: {}", e)))?;

            let rows = stmt
                .query_map([], read_row)
                .map_err(|e| Error::persistence(format!("Failed to list records: {}", e)))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::persistence(format!("Failed to read record: {}", e)))?;
            rows
        };

        rows.into_iter().map(row_to_record).collect()
    }

    /// Record by ID
    pub fn get(&self, id: &Uuid) -> Result<Option<ExtractedRecord>> {
        let row: Option<RawRow> = {
            let conn = self.conn.lock();
            let row = conn
                .query_row(
                    &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                    params![id.to_string()],
                    read_row,
                )
                .optional()
                .map_err(|e| Error::persistence(format!("Failed to get record: {}", e)))?;
            row
        };

        row.map(row_to_record).transpose()
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM extracted_data", [], |row| row.get(0))
            .map_err(|e| Error::persistence(format!("Failed to count records: {}", e)))?;
        Ok(count as usize)
    }
}

/// Fixed-width RFC 3339 so lexical order equals time order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn row_to_record((id, file_name, content, created_at): RawRow) -> Result<ExtractedRecord> {
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::persistence(format!("Corrupt record id '{}': {}", id, e)))?;
    let extracted_content: FlatContent = serde_json::from_str(&content)
        .map_err(|e| Error::persistence(format!("Corrupt content for record {}: {}", id, e)))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::persistence(format!("Corrupt timestamp for record {}: {}", id, e)))?;

    Ok(ExtractedRecord {
        id,
        file_name,
        extracted_content,
        created_at,
    })
}

//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for extraction records.

mod database;

pub use database::RecordStore;

//! Storage module for persisting crawl data
//!
//! This module handles all database operations, including:
//! - Per-statement transactional execution through the [`Gateway`]
//! - Idempotent schema creation
//! - Crawl and record persistence
//! - Read-side queries for statistics

mod gateway;
mod schema;
mod sqlite;
mod traits;

pub use gateway::Gateway;
pub use schema::{ensure_schema, SCHEMA_SQL};
pub use sqlite::SqliteStorage;
pub use traits::{CrawlHistory, CrawlStore, PersistenceError, PersistenceResult};

use crate::source::{BoardEntry, DetailRecord, ItemId};
use chrono::{DateTime, Duration, Utc};

/// Represents a crawl cycle in the database
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlRecord {
    pub id: i64,
    pub begin_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl CrawlRecord {
    /// Whether the cycle closed normally
    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.begin_time)
    }
}

/// A board entry about to be written for a crawl
#[derive(Debug, Clone, Copy)]
pub struct NewRecord<'a> {
    pub crawl_id: i64,
    pub ranking: u32,
    pub entry: &'a BoardEntry,
    pub detail: &'a DetailRecord,
}

/// Represents a stored record
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub crawl_id: i64,
    pub ranking: u32,
    pub item_id: ItemId,
    pub title: String,
    pub heat: String,
    pub excerpt: Option<String>,
    pub url: String,
    /// Detail fields; `title` is never stored and is always `None` here
    pub detail: DetailRecord,
}

/// Converts a timestamp into the stored Unix-seconds form
pub fn to_epoch(time: DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / 1_000_000.0
}

/// Converts stored Unix seconds back into a timestamp
pub fn from_epoch(seconds: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros((seconds * 1_000_000.0).round() as i64).unwrap_or_default()
}

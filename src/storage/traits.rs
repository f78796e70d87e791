//! Storage traits and error types
//!
//! The orchestrator writes through [`CrawlStore`]; reporting reads through
//! [`CrawlHistory`].

use crate::storage::{CrawlRecord, NewRecord, StoredRecord};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Statement failed: {statement}: {source}")]
    Statement {
        statement: String,
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Crawl not found: {0}")]
    CrawlNotFound(i64),

    #[error("Database file not found: {}", .0.display())]
    MissingDatabase(PathBuf),
}

/// Result type for storage operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Write side used by the crawl loop
///
/// Every method is an independent transaction; a cycle is a sequence of such
/// calls, never one large transaction.
pub trait CrawlStore {
    /// Creates the tables if they do not exist yet
    fn ensure_schema(&mut self) -> PersistenceResult<()>;

    /// Opens a crawl row and returns its id
    fn begin_crawl(&mut self, begin_time: DateTime<Utc>) -> PersistenceResult<i64>;

    /// Sets the end time of an open crawl
    fn end_crawl(&mut self, crawl_id: i64, end_time: DateTime<Utc>) -> PersistenceResult<()>;

    /// Inserts one harvested item and returns its record id
    fn add_record(&mut self, record: &NewRecord<'_>) -> PersistenceResult<i64>;
}

/// Read side used by statistics and tests
pub trait CrawlHistory {
    fn get_crawl(&self, crawl_id: i64) -> PersistenceResult<CrawlRecord>;

    /// Most recent crawls first
    fn latest_crawls(&self, limit: usize) -> PersistenceResult<Vec<CrawlRecord>>;

    /// Records of one crawl ordered by ranking
    fn get_records(&self, crawl_id: i64) -> PersistenceResult<Vec<StoredRecord>>;

    fn count_crawls(&self) -> PersistenceResult<u64>;

    /// Crawls that have an end time
    fn count_completed_crawls(&self) -> PersistenceResult<u64>;

    fn count_records(&self) -> PersistenceResult<u64>;

    /// Records whose enrichment failed or was skipped
    fn count_records_without_detail(&self) -> PersistenceResult<u64>;

    /// Records whose item id could not be parsed
    fn count_unidentified_records(&self) -> PersistenceResult<u64>;

    fn count_records_for_crawl(&self, crawl_id: i64) -> PersistenceResult<u64>;
}

//! SQLite storage implementation
//!
//! This module provides the SQLite-backed [`CrawlStore`] and [`CrawlHistory`].
//! All statements go through the [`Gateway`].

use crate::source::{DetailRecord, ItemId};
use crate::storage::gateway::Gateway;
use crate::storage::schema::ensure_schema;
use crate::storage::traits::{CrawlHistory, CrawlStore, PersistenceError, PersistenceResult};
use crate::storage::{from_epoch, to_epoch, CrawlRecord, NewRecord, StoredRecord};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use std::path::Path;

const SELECT_CRAWL: &str = "SELECT id, begin_time, end_time FROM crawl";

const SELECT_RECORD: &str = "SELECT id, crawl_id, ranking, item_id, title, heat, excerpt, url,
     created_at, visit_count, follower_count, answer_count, raw_body, fetched_at
     FROM record";

/// SQLite storage backend
pub struct SqliteStorage {
    gateway: Gateway,
}

impl SqliteStorage {
    /// Opens or creates the database file
    ///
    /// The schema is not touched here; call [`CrawlStore::ensure_schema`].
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        Ok(Self {
            gateway: Gateway::open(path)?,
        })
    }

    /// Opens a database file that must already exist
    ///
    /// Used by read-only reporting so a mistyped path is not silently
    /// turned into an empty database.
    pub fn open_existing(path: &Path) -> PersistenceResult<Self> {
        Ok(Self {
            gateway: Gateway::open_existing(path)?,
        })
    }

    /// Creates an in-memory database with the schema installed
    pub fn new_in_memory() -> PersistenceResult<Self> {
        let mut storage = Self {
            gateway: Gateway::open_in_memory()?,
        };
        storage.ensure_schema()?;
        Ok(storage)
    }

    fn count(&self, sql: &str, params: &[Value]) -> PersistenceResult<u64> {
        let rows = self.gateway.query(sql, params, |row| row.get::<_, i64>(0))?;
        Ok(rows.first().copied().unwrap_or(0) as u64)
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn optional<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Null, Into::into)
}

fn crawl_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlRecord> {
    Ok(CrawlRecord {
        id: row.get(0)?,
        begin_time: from_epoch(row.get(1)?),
        end_time: row.get::<_, Option<f64>>(2)?.map(from_epoch),
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        id: row.get(0)?,
        crawl_id: row.get(1)?,
        ranking: row.get(2)?,
        item_id: ItemId::from_db(row.get(3)?),
        title: row.get(4)?,
        heat: row.get(5)?,
        excerpt: row.get(6)?,
        url: row.get(7)?,
        detail: DetailRecord {
            created_at: row.get(8)?,
            visit_count: row.get(9)?,
            follower_count: row.get(10)?,
            answer_count: row.get(11)?,
            title: None,
            raw_body: row.get(12)?,
            fetched_at: row.get::<_, Option<f64>>(13)?.map(from_epoch),
        },
    })
}

impl CrawlStore for SqliteStorage {
    fn ensure_schema(&mut self) -> PersistenceResult<()> {
        ensure_schema(&mut self.gateway)
    }

    fn begin_crawl(&mut self, begin_time: DateTime<Utc>) -> PersistenceResult<i64> {
        self.gateway.execute(
            "INSERT INTO crawl (begin_time) VALUES (?1)",
            &[Value::Real(to_epoch(begin_time))],
            |tx, _| Ok(tx.last_insert_rowid()),
        )
    }

    fn end_crawl(&mut self, crawl_id: i64, end_time: DateTime<Utc>) -> PersistenceResult<()> {
        let changed = self.gateway.execute(
            "UPDATE crawl SET end_time = ?1 WHERE id = ?2",
            &[Value::Real(to_epoch(end_time)), Value::Integer(crawl_id)],
            |_, changed| Ok(changed),
        )?;

        if changed == 0 {
            return Err(PersistenceError::CrawlNotFound(crawl_id));
        }
        Ok(())
    }

    fn add_record(&mut self, record: &NewRecord<'_>) -> PersistenceResult<i64> {
        let entry = record.entry;
        let detail = record.detail;

        self.gateway.execute(
            "INSERT INTO record (item_id, crawl_id, title, heat, created_at, visit_count,
             follower_count, answer_count, excerpt, raw_body, ranking, fetched_at, url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            &[
                Value::Integer(entry.item_id.to_db()),
                Value::Integer(record.crawl_id),
                text(&entry.title),
                text(&entry.heat),
                optional(detail.created_at),
                optional(detail.visit_count),
                optional(detail.follower_count),
                optional(detail.answer_count),
                optional(entry.excerpt.clone()),
                optional(detail.raw_body.clone()),
                Value::Integer(i64::from(record.ranking)),
                optional(detail.fetched_at.map(to_epoch)),
                text(&entry.url),
            ],
            |tx, _| Ok(tx.last_insert_rowid()),
        )
    }
}

impl CrawlHistory for SqliteStorage {
    fn get_crawl(&self, crawl_id: i64) -> PersistenceResult<CrawlRecord> {
        self.gateway
            .query(
                &format!("{} WHERE id = ?1", SELECT_CRAWL),
                &[Value::Integer(crawl_id)],
                crawl_from_row,
            )?
            .into_iter()
            .next()
            .ok_or(PersistenceError::CrawlNotFound(crawl_id))
    }

    fn latest_crawls(&self, limit: usize) -> PersistenceResult<Vec<CrawlRecord>> {
        self.gateway.query(
            &format!("{} ORDER BY id DESC LIMIT ?1", SELECT_CRAWL),
            &[Value::Integer(limit as i64)],
            crawl_from_row,
        )
    }

    fn get_records(&self, crawl_id: i64) -> PersistenceResult<Vec<StoredRecord>> {
        self.gateway.query(
            &format!("{} WHERE crawl_id = ?1 ORDER BY ranking", SELECT_RECORD),
            &[Value::Integer(crawl_id)],
            record_from_row,
        )
    }

    fn count_crawls(&self) -> PersistenceResult<u64> {
        self.count("SELECT COUNT(*) FROM crawl", &[])
    }

    fn count_completed_crawls(&self) -> PersistenceResult<u64> {
        self.count("SELECT COUNT(*) FROM crawl WHERE end_time IS NOT NULL", &[])
    }

    fn count_records(&self) -> PersistenceResult<u64> {
        self.count("SELECT COUNT(*) FROM record", &[])
    }

    fn count_records_without_detail(&self) -> PersistenceResult<u64> {
        self.count("SELECT COUNT(*) FROM record WHERE fetched_at IS NULL", &[])
    }

    fn count_unidentified_records(&self) -> PersistenceResult<u64> {
        self.count("SELECT COUNT(*) FROM record WHERE item_id = 0", &[])
    }

    fn count_records_for_crawl(&self, crawl_id: i64) -> PersistenceResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM record WHERE crawl_id = ?1",
            &[Value::Integer(crawl_id)],
        )
    }
}

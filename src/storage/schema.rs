//! Database schema definitions
//!
//! This module contains the SQL schema for the Trendwatch database and the
//! idempotent routine that installs it.

use crate::storage::gateway::Gateway;
use crate::storage::traits::PersistenceResult;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per harvesting cycle; end_time stays NULL when the cycle aborted
CREATE TABLE IF NOT EXISTS crawl (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    begin_time REAL NOT NULL,
    end_time REAL
);

-- One row per board entry per cycle
CREATE TABLE IF NOT EXISTS record (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL,
    crawl_id INTEGER NOT NULL REFERENCES crawl(id),
    fetched_at REAL,
    ranking INTEGER NOT NULL,
    title TEXT NOT NULL,
    heat TEXT NOT NULL,
    created_at INTEGER,
    visit_count INTEGER,
    follower_count INTEGER,
    answer_count INTEGER,
    excerpt TEXT,
    raw_body TEXT,
    url TEXT NOT NULL,
    UNIQUE(crawl_id, ranking)
);

CREATE INDEX IF NOT EXISTS idx_record_crawl ON record(crawl_id);
CREATE INDEX IF NOT EXISTS idx_record_item ON record(item_id);
"#;

/// Ensures both tables exist
///
/// Safe to call on every start; existing data is left untouched.
pub fn ensure_schema(gateway: &mut Gateway) -> PersistenceResult<()> {
    gateway.execute_batch(SCHEMA_SQL)
}

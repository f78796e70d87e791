//! Crawl loop and its building blocks
//!
//! - rate limiting between items and between cycles
//! - the per-item enrichment step
//! - the cycle orchestrator

mod enrich;
mod limiter;
mod orchestrator;

pub use enrich::{enrich, Enrichment};
pub use limiter::{IntervalKey, RateLimiter};
pub use orchestrator::{CycleError, CycleOutcome, CycleReport, Orchestrator};

use crate::config::Config;
use crate::source::HttpSource;
use crate::storage::SqliteStorage;
use std::path::Path;

/// Wires the HTTP source and the SQLite store together and runs the loop
///
/// With `cycles` set the loop stops after that many cycles, otherwise it
/// runs until the process is killed. Only startup failures are returned.
pub async fn watch(config: &Config, cycles: Option<u32>) -> crate::Result<()> {
    let source = HttpSource::new(&config.source)?;
    let store = SqliteStorage::open(Path::new(&config.storage.database_path))?;
    let limiter = RateLimiter::new(config.intervals.clone());

    tracing::info!(
        database = %config.storage.database_path,
        board_url = %config.source.board_url,
        "Crawler ready"
    );

    // Board and detail share one client
    let mut orchestrator = Orchestrator::new(source.clone(), source, store, limiter)
        .with_top(config.crawler.top);

    match cycles {
        Some(n) => {
            let outcomes = orchestrator.run_cycles(n).await?;
            let failed = outcomes.iter().filter(|o| o.is_err()).count();
            tracing::info!(cycles = n, failed, "Finished requested cycles");
        }
        None => orchestrator.run().await?,
    }

    Ok(())
}

//! Crawl orchestrator - the harvesting loop
//!
//! Each cycle opens a crawl row, fetches the board, enriches and stores every
//! entry in board order, closes the crawl row and sleeps until the next
//! cycle is due. Item failures are logged and skipped over; cycle failures
//! abort only the current cycle. The loop itself never stops.

use crate::crawler::enrich::{enrich, Enrichment};
use crate::crawler::limiter::{IntervalKey, RateLimiter};
use crate::source::{BoardEntry, BoardSource, DetailRecord, DetailSource};
use crate::storage::{CrawlStore, NewRecord, PersistenceError};
use crate::SourceError;
use chrono::{Duration, Utc};
use thiserror::Error;

/// Failures that abort a cycle
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Failed to open crawl: {0}")]
    OpenCrawl(#[source] PersistenceError),

    #[error("Failed to fetch board for crawl {crawl_id}: {source}")]
    Board { crawl_id: i64, source: SourceError },

    #[error("Failed to close crawl {crawl_id}: {source}")]
    CloseCrawl {
        crawl_id: i64,
        source: PersistenceError,
    },
}

impl CycleError {
    /// Crawl the failure belongs to, if one was opened
    pub fn crawl_id(&self) -> Option<i64> {
        match self {
            Self::OpenCrawl(_) => None,
            Self::Board { crawl_id, .. } | Self::CloseCrawl { crawl_id, .. } => Some(*crawl_id),
        }
    }
}

/// What happened during one successful cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub crawl_id: i64,
    /// Entries processed after applying `top`
    pub board_len: usize,
    pub records_written: usize,
    pub enrichment_failures: usize,
    pub unidentified: usize,
    pub write_failures: usize,
}

/// Result of one cycle as seen by the loop
pub type CycleOutcome = Result<CycleReport, CycleError>;

/// Drives crawl cycles over a board source, a detail source and a store
pub struct Orchestrator<B, D, S> {
    board: B,
    detail: D,
    store: S,
    limiter: RateLimiter,
    top: Option<usize>,
}

impl<B, D, S> Orchestrator<B, D, S>
where
    B: BoardSource,
    D: DetailSource,
    S: CrawlStore,
{
    pub fn new(board: B, detail: D, store: S, limiter: RateLimiter) -> Self {
        Self {
            board,
            detail,
            store,
            limiter,
            top: None,
        }
    }

    /// Only process the first `top` board entries of every cycle
    pub fn with_top(mut self, top: Option<usize>) -> Self {
        self.top = top;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Ensures the schema; must succeed before any cycle runs
    pub fn prepare(&mut self) -> Result<(), PersistenceError> {
        self.store.ensure_schema()
    }

    /// Runs cycles forever
    ///
    /// Only a schema failure at startup makes this return.
    pub async fn run(&mut self) -> Result<(), PersistenceError> {
        self.prepare()?;
        loop {
            // Outcomes are already logged; a failed cycle does not stop the loop
            let _ = self.cycle_and_sleep().await;
        }
    }

    /// Runs exactly `cycles` cycles, sleeping between them but not after the
    /// last one
    pub async fn run_cycles(&mut self, cycles: u32) -> Result<Vec<CycleOutcome>, PersistenceError> {
        self.prepare()?;

        let mut outcomes = Vec::with_capacity(cycles as usize);
        for n in 0..cycles {
            if n + 1 < cycles {
                outcomes.push(self.cycle_and_sleep().await);
            } else {
                let outcome = self.run_cycle().await;
                log_outcome(&outcome);
                outcomes.push(outcome);
            }
        }
        Ok(outcomes)
    }

    /// One cycle followed by the drift-corrected sleep
    async fn cycle_and_sleep(&mut self) -> CycleOutcome {
        let started = Utc::now();
        let outcome = self.run_cycle().await;
        log_outcome(&outcome);

        let elapsed = Utc::now() - started;
        self.limiter.wait(IntervalKey::BetweenCycle, -elapsed).await;
        outcome
    }

    /// Runs one cycle without the trailing sleep
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        tracing::info!("Begin crawling ...");

        let crawl_id = self
            .store
            .begin_crawl(Utc::now())
            .map_err(CycleError::OpenCrawl)?;

        let mut entries = self
            .board
            .fetch_board()
            .await
            .map_err(|source| CycleError::Board { crawl_id, source })?;

        tracing::info!(
            crawl_id,
            "Get {} items: {}",
            entries.len(),
            summarize_titles(&entries)
        );

        if let Some(top) = self.top {
            entries.truncate(top);
        }

        let mut report = CycleReport {
            crawl_id,
            board_len: entries.len(),
            ..CycleReport::default()
        };

        for (ranking, entry) in entries.iter().enumerate() {
            self.limiter
                .wait(IntervalKey::BetweenItem, Duration::zero())
                .await;
            self.process_entry(crawl_id, ranking as u32, entry, &mut report)
                .await;
        }

        self.store
            .end_crawl(crawl_id, Utc::now())
            .map_err(|source| CycleError::CloseCrawl { crawl_id, source })?;

        Ok(report)
    }

    /// Enriches and stores one entry; failures stay local to the entry
    async fn process_entry(
        &mut self,
        crawl_id: i64,
        ranking: u32,
        entry: &BoardEntry,
        report: &mut CycleReport,
    ) {
        let detail = match enrich(&self.detail, entry).await {
            Ok(Enrichment::Fetched(detail)) => {
                tracing::info!(
                    crawl_id,
                    ranking,
                    "Get question detail for {}: raw detail length {}",
                    entry.title,
                    detail.raw_body.as_ref().map_or(0, String::len)
                );
                detail
            }
            Ok(skipped @ Enrichment::Unidentified) => {
                tracing::warn!(
                    "Unparsed URL @ {} ranking {} in crawl {}.",
                    entry.url,
                    ranking,
                    crawl_id
                );
                report.unidentified += 1;
                skipped.into_detail()
            }
            Err(e) => {
                tracing::error!(
                    crawl_id,
                    ranking,
                    url = %entry.url,
                    "Failed to fetch detail: {}",
                    e
                );
                report.enrichment_failures += 1;
                DetailRecord::empty()
            }
        };

        let record = NewRecord {
            crawl_id,
            ranking,
            entry,
            detail: &detail,
        };
        match self.store.add_record(&record) {
            Ok(_) => report.records_written += 1,
            Err(e) => {
                tracing::error!(crawl_id, ranking, "Exception when adding entry: {}", e);
                report.write_failures += 1;
            }
        }
    }
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        Ok(report) => tracing::info!(
            crawl_id = report.crawl_id,
            records = report.records_written,
            enrichment_failures = report.enrichment_failures,
            unidentified = report.unidentified,
            write_failures = report.write_failures,
            "Crawl finished"
        ),
        Err(e) => tracing::error!(
            crawl_id = ?e.crawl_id(),
            "Crawl {:?} encountered an exception: {}. This crawl stopped.",
            e.crawl_id(),
            e
        ),
    }
}

/// First 20 characters of every title, comma separated
fn summarize_titles(entries: &[BoardEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.title.chars().take(20).collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
}

//! Statistics over the crawl history
//!
//! Loads summary counts from a [`CrawlHistory`] and prints them.

use crate::storage::{CrawlHistory, CrawlRecord, PersistenceError};

/// Number of recent crawls listed by [`load_statistics`]
pub const LATEST_CRAWLS: usize = 10;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub total_crawls: u64,

    /// Crawls with an end time
    pub completed_crawls: u64,

    pub total_records: u64,

    /// Records whose enrichment failed or was skipped
    pub records_without_detail: u64,

    /// Records whose URL carried no item id
    pub unidentified_records: u64,

    /// Most recent crawls, newest first
    pub latest_crawls: Vec<CrawlRecord>,
}

impl CrawlStatistics {
    /// Crawls that never got an end time: board failures, close failures,
    /// and a cycle still running
    pub fn aborted_crawls(&self) -> u64 {
        self.total_crawls.saturating_sub(self.completed_crawls)
    }

    /// Share of records that carry detail, in percent
    pub fn detail_rate(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        // Counts come from separate queries and may race a running crawler
        let with_detail = self.total_records.saturating_sub(self.records_without_detail);
        (with_detail as f64 / self.total_records as f64) * 100.0
    }
}

/// Loads statistics from storage
pub fn load_statistics(history: &dyn CrawlHistory) -> Result<CrawlStatistics, PersistenceError> {
    Ok(CrawlStatistics {
        total_crawls: history.count_crawls()?,
        completed_crawls: history.count_completed_crawls()?,
        total_records: history.count_records()?,
        records_without_detail: history.count_records_without_detail()?,
        unidentified_records: history.count_unidentified_records()?,
        latest_crawls: history.latest_crawls(LATEST_CRAWLS)?,
    })
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Crawls:");
    println!("  Total: {}", stats.total_crawls);
    println!("  Completed: {}", stats.completed_crawls);
    println!("  Aborted or running: {}", stats.aborted_crawls());
    println!();

    println!("Records:");
    println!("  Total: {}", stats.total_records);
    println!("  Without detail: {}", stats.records_without_detail);
    println!("  Unidentified: {}", stats.unidentified_records);
    println!("  Detail rate: {:.1}%", stats.detail_rate());
    println!();

    if !stats.latest_crawls.is_empty() {
        println!("Latest Crawls ({}):", stats.latest_crawls.len());
        for crawl in &stats.latest_crawls {
            println!("  {}", format_crawl(crawl));
        }
    }
}

fn format_crawl(crawl: &CrawlRecord) -> String {
    let begin = crawl.begin_time.format("%Y-%m-%d %H:%M:%S");
    match crawl.duration() {
        Some(duration) => format!(
            "#{} {} ({:.1}s)",
            crawl.id,
            begin,
            duration.num_milliseconds() as f64 / 1000.0
        ),
        None => format!("#{} {} (no end time)", crawl.id, begin),
    }
}

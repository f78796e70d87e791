//! Reporting over stored crawls
//!
//! Backs the `--stats` mode of the binary.

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};

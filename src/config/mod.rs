//! Configuration module for Trendwatch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use trendwatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trendwatch.toml")).unwrap();
//! println!("Cycle interval: {}ms", config.intervals.interval_between_cycle);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, IntervalConfig, LoggingConfig, SourceConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

use serde::Deserialize;

/// Main configuration structure for Trendwatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub intervals: IntervalConfig,
    pub storage: StorageConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Named wait durations used by the rate limiter (milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct IntervalConfig {
    /// Pause before each item enrichment within a cycle
    #[serde(rename = "interval-between-item")]
    pub interval_between_item: u64,

    /// Cadence of cycle starts; the sleep after a cycle is shortened by the
    /// time the cycle itself took
    #[serde(rename = "interval-between-cycle")]
    pub interval_between_cycle: u64,
}

/// Store connection parameters
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Remote board and detail endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Page carrying the trending board
    #[serde(rename = "board-url")]
    pub board_url: String,

    /// Item pages live at this prefix followed by the numeric item id
    #[serde(rename = "question-url-prefix")]
    pub question_url_prefix: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Raw `Cookie` header sent with every request
    #[serde(default)]
    pub cookie: Option<String>,

    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Crawl loop tuning
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlerConfig {
    /// Only process the first `top` board entries
    #[serde(default)]
    pub top: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log file written alongside stderr
    #[serde(default)]
    pub file: Option<String>,
}

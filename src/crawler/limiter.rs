//! Rate limiting between items and between cycles
//!
//! Waits are a configured base duration plus a signed delta. The cycle wait
//! passes the negated cycle duration as delta so cycle starts stay on a fixed
//! cadence; when a cycle overruns its interval the wait is clamped to zero.

use crate::config::IntervalConfig;
use chrono::Duration as Delta;
use std::time::Duration;

/// Named wait durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalKey {
    BetweenItem,
    BetweenCycle,
}

impl IntervalKey {
    /// Configuration key of this interval
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BetweenItem => "interval-between-item",
            Self::BetweenCycle => "interval-between-cycle",
        }
    }
}

/// Blocks the crawl loop for configured intervals
#[derive(Debug, Clone)]
pub struct RateLimiter {
    intervals: IntervalConfig,
}

impl RateLimiter {
    pub fn new(intervals: IntervalConfig) -> Self {
        Self { intervals }
    }

    /// Configured base duration for `key`
    pub fn base(&self, key: IntervalKey) -> Duration {
        let millis = match key {
            IntervalKey::BetweenItem => self.intervals.interval_between_item,
            IntervalKey::BetweenCycle => self.intervals.interval_between_cycle,
        };
        Duration::from_millis(millis)
    }

    /// Computes `base(key) + delta`, clamped at zero
    pub fn compute(&self, key: IntervalKey, delta: Delta) -> Duration {
        let base = self.base(key);
        if delta >= Delta::zero() {
            base + delta.to_std().unwrap_or_default()
        } else {
            // to_std rejects negative values, so subtract the magnitude instead
            let shortfall = (-delta).to_std().unwrap_or(Duration::MAX);
            base.saturating_sub(shortfall)
        }
    }

    /// Sleeps for `base(key) + delta`
    pub async fn wait(&self, key: IntervalKey, delta: Delta) {
        let duration = self.compute(key, delta);

        if duration.is_zero() && delta < Delta::zero() {
            tracing::warn!(
                key = key.as_str(),
                overrun_ms = (-delta).num_milliseconds() - self.base(key).as_millis() as i64,
                "Cycle took longer than its interval, not sleeping"
            );
        }

        tracing::info!(key = key.as_str(), "Sleep {:.3} second(s)", duration.as_secs_f64());
        tokio::time::sleep(duration).await;
    }
}

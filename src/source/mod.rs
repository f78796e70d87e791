//! Board and detail sources
//!
//! The orchestrator only talks to the [`BoardSource`] and [`DetailSource`]
//! traits. [`HttpSource`] is the concrete implementation that reads the page
//! state embedded in the remote site's HTML.

mod http;
mod types;

pub use http::{build_http_client, extract_page_state, parse_board, parse_detail, HttpSource};
pub use types::{BoardEntry, DetailRecord, ItemId};

use crate::SourceError;
use std::future::Future;

/// Lists the current board, highest ranked first
pub trait BoardSource {
    fn fetch_board(&self) -> impl Future<Output = Result<Vec<BoardEntry>, SourceError>> + Send;
}

/// Fetches the detail record of one identified item
pub trait DetailSource {
    /// Must not be called for [`ItemId::Unparsed`] entries.
    fn fetch_detail(&self, item_id: u64)
        -> impl Future<Output = Result<DetailRecord, SourceError>> + Send;
}

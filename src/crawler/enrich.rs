//! Item enrichment step
//!
//! Enrichment is best effort: a failure is returned once, never retried, and
//! the caller substitutes an empty detail record.

use crate::source::{BoardEntry, DetailRecord, DetailSource, ItemId};
use crate::SourceError;

/// Outcome of enriching one board entry
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Fetched(DetailRecord),
    /// The entry has no parsable item id; no request was made
    Unidentified,
}

impl Enrichment {
    pub fn into_detail(self) -> DetailRecord {
        match self {
            Self::Fetched(detail) => detail,
            Self::Unidentified => DetailRecord::empty(),
        }
    }
}

/// Fetches the detail record of `entry` through `source`
pub async fn enrich<D: DetailSource>(
    source: &D,
    entry: &BoardEntry,
) -> Result<Enrichment, SourceError> {
    match entry.item_id {
        ItemId::Unparsed => Ok(Enrichment::Unidentified),
        ItemId::Identified(id) => source.fetch_detail(id).await.map(Enrichment::Fetched),
    }
}

use chrono::{DateTime, Utc};

/// Identifier of a board item
///
/// Items whose URL does not follow the item URL pattern are kept on the board
/// but cannot be enriched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemId {
    Identified(u64),
    Unparsed,
}

impl ItemId {
    /// Parses the item id out of `url` when it is `prefix` followed by a
    /// positive integer (an optional trailing slash is tolerated)
    ///
    /// # Example
    ///
    /// ```
    /// use trendwatch::ItemId;
    ///
    /// let prefix = "https://www.zhihu.com/question/";
    /// assert_eq!(
    ///     ItemId::from_url("https://www.zhihu.com/question/541600869", prefix),
    ///     ItemId::Identified(541600869)
    /// );
    /// assert_eq!(
    ///     ItemId::from_url("https://www.zhihu.com/special/1", prefix),
    ///     ItemId::Unparsed
    /// );
    /// ```
    pub fn from_url(url: &str, prefix: &str) -> Self {
        url.strip_prefix(prefix)
            .map(|rest| rest.strip_suffix('/').unwrap_or(rest))
            .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
            // Ids must fit the signed INTEGER column
            .and_then(|rest| rest.parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map_or(Self::Unparsed, |id| Self::Identified(id as u64))
    }

    /// Storage encoding; unparsed ids, and ids too large for the column,
    /// are stored as 0
    pub fn to_db(self) -> i64 {
        match self {
            Self::Identified(id) => i64::try_from(id).unwrap_or(0),
            Self::Unparsed => 0,
        }
    }

    pub fn from_db(value: i64) -> Self {
        if value > 0 {
            Self::Identified(value as u64)
        } else {
            Self::Unparsed
        }
    }
}

/// One entry of the trending board, in board order
#[derive(Debug, Clone, PartialEq)]
pub struct BoardEntry {
    pub title: String,
    /// Display heat as shown by the source (e.g. "76万热度")
    pub heat: String,
    pub excerpt: Option<String>,
    pub url: String,
    pub item_id: ItemId,
}

/// Detail fields of one item
///
/// Every field is `None` when enrichment failed or was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailRecord {
    /// Creation time of the item at the source (Unix seconds)
    pub created_at: Option<i64>,
    pub visit_count: Option<i64>,
    pub follower_count: Option<i64>,
    pub answer_count: Option<i64>,
    pub title: Option<String>,
    pub raw_body: Option<String>,
    /// When the detail request was issued
    pub fetched_at: Option<DateTime<Utc>>,
}

impl DetailRecord {
    /// Record used when no detail could be obtained
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

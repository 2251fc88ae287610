use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of crops kept in history. Not user-configurable.
pub const MAX_HISTORY_ITEMS: usize = 10;

/// Key under which the serialized history list is stored.
pub const HISTORY_KEY: &str = "image_history";

/// One retained crop result.
///
/// Field names on the wire are `id`, `src` and `timestamp`, so a list written
/// by the browser build of the tool loads unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    #[serde(rename = "src")]
    pub encoded_image: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Builds a record stamped with the current time at millisecond precision.
    pub fn new(id: i64, encoded_image: impl Into<String>) -> Self {
        Self {
            id,
            encoded_image: encoded_image.into(),
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}

/// Newest-first list of history records.
pub type HistoryList = Vec<HistoryRecord>;

/// What happened the last time the history store wrote its mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Nothing has been written yet this session.
    Idle,
    /// The list was written; `evicted` records were dropped to fit the quota.
    Saved { kept: usize, evicted: usize },
    /// The persisted key was deleted.
    Removed,
    /// The write was given up; the persisted copy is stale.
    Abandoned,
}

/// Which list `add` and `remove` hand back after quota-driven eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HistoryConsistency {
    /// Trim the in-memory list to exactly what was persisted.
    #[default]
    MirrorPersisted,
    /// Keep the capacity-truncated list for the rest of the session.
    KeepSession,
}

//! History Store for PasteCrop.
//!
//! Keeps the newest-first list of recent crops in memory and mirrors it to a
//! [`KeyValueStore`] after every change. The mirror is best effort: when the
//! store runs out of quota the oldest records are dropped from the written
//! copy until it fits, and if nothing fits the write is abandoned. Neither
//! case is reported to the caller; the in-memory list stays authoritative for
//! the session.

use tracing::{debug, info, warn};

use crate::services::data_url;
use crate::storage::KeyValueStore;
use crate::types::errors::HistoryError;
use crate::types::history::{
    HistoryConsistency, HistoryList, HistoryRecord, PersistOutcome, HISTORY_KEY,
    MAX_HISTORY_ITEMS,
};

/// Trait defining history store operations.
pub trait HistoryStoreTrait {
    fn initialize(&mut self) -> HistoryList;
    fn list(&self) -> &[HistoryRecord];
    fn add(&mut self, encoded_image: &str) -> Result<HistoryList, HistoryError>;
    fn remove(&mut self, id: i64) -> HistoryList;
    fn clear(&mut self) -> HistoryList;
}

/// Bounded crop history persisted through `S`.
pub struct HistoryStore<S: KeyValueStore> {
    storage: S,
    history: HistoryList,
    consistency: HistoryConsistency,
    last_id: i64,
    last_persist: PersistOutcome,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Creates an empty store. Call [`HistoryStoreTrait::initialize`] to load
    /// the persisted list.
    pub fn new(storage: S) -> Self {
        Self::with_consistency(storage, HistoryConsistency::default())
    }

    pub fn with_consistency(storage: S, consistency: HistoryConsistency) -> Self {
        Self {
            storage,
            history: Vec::new(),
            consistency,
            last_id: 0,
            last_persist: PersistOutcome::Idle,
        }
    }

    pub fn consistency(&self) -> HistoryConsistency {
        self.consistency
    }

    /// Outcome of the most recent write to the persisted mirror.
    pub fn last_persist(&self) -> PersistOutcome {
        self.last_persist
    }

    /// Looks up a record by id.
    pub fn get(&self, id: i64) -> Option<&HistoryRecord> {
        self.history.iter().find(|r| r.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the store and hands back its backing storage, e.g. to reload
    /// it into a fresh store.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Next unique id: the current time in milliseconds, or one past the last
    /// id issued or loaded if the clock has not moved past it.
    ///
    /// Once `last_id` reaches `i64::MAX` (only possible with a doctored
    /// mirror) ids restart from the clock, skipping any still held.
    fn next_id(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut id = match self.last_id.checked_add(1) {
            Some(next) => now.max(next),
            None => now,
        };
        while self.history.iter().any(|r| r.id == id) {
            id = id.wrapping_add(1);
        }
        self.last_id = id;
        id
    }

    /// Reads the mirror. Any failure yields an empty list.
    fn load_persisted(&self) -> HistoryList {
        let raw = match self.storage.get_item(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read history, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<HistoryList>(&raw) {
            Ok(list) => normalize(list),
            Err(e) => {
                warn!(error = %e, "Failed to parse history, starting empty");
                Vec::new()
            }
        }
    }

    /// Writes the current list, evicting oldest records while the store
    /// reports quota exhaustion.
    fn persist(&mut self) -> PersistOutcome {
        let mut pending = self.history.clone();
        let mut evicted = 0;

        loop {
            let payload = match serde_json::to_string(&pending) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize history, not persisting");
                    return PersistOutcome::Abandoned;
                }
            };

            match self.storage.set_item(HISTORY_KEY, &payload) {
                Ok(()) => {
                    if evicted > 0 {
                        warn!(
                            kept = pending.len(),
                            evicted, "History persisted after evicting records to fit quota"
                        );
                        if self.consistency == HistoryConsistency::MirrorPersisted {
                            self.history = pending.clone();
                        }
                    } else {
                        debug!(kept = pending.len(), "History persisted");
                    }
                    return PersistOutcome::Saved {
                        kept: pending.len(),
                        evicted,
                    };
                }
                Err(e) if e.is_quota_exceeded() && !pending.is_empty() => {
                    pending.pop();
                    evicted += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to persist history, keeping it in memory only");
                    return PersistOutcome::Abandoned;
                }
            }
        }
    }
}

impl<S: KeyValueStore> HistoryStoreTrait for HistoryStore<S> {
    /// Replaces the in-memory list with the persisted one. Never fails: a
    /// missing, unreadable or malformed mirror yields an empty history.
    fn initialize(&mut self) -> HistoryList {
        self.history = self.load_persisted();
        self.last_id = self.history.iter().map(|r| r.id).max().unwrap_or(0);
        info!(items = self.history.len(), "History loaded");
        self.history.clone()
    }

    /// Returns the current list, newest first.
    fn list(&self) -> &[HistoryRecord] {
        &self.history
    }

    /// Records a new crop at the front of the history, dropping the oldest
    /// entry past [`MAX_HISTORY_ITEMS`].
    ///
    /// Only malformed input is an error; persistence problems are logged.
    fn add(&mut self, encoded_image: &str) -> Result<HistoryList, HistoryError> {
        if !data_url::is_data_url(encoded_image) {
            return Err(HistoryError::InvalidImage(
                "expected a data: URL".to_string(),
            ));
        }

        let record = HistoryRecord::new(self.next_id(), encoded_image);
        debug!(id = record.id, bytes = encoded_image.len(), "Adding crop to history");
        self.history.insert(0, record);
        self.history.truncate(MAX_HISTORY_ITEMS);

        self.last_persist = self.persist();
        Ok(self.history.clone())
    }

    /// Removes the record with `id`. Unknown ids leave the list untouched.
    fn remove(&mut self, id: i64) -> HistoryList {
        self.history.retain(|r| r.id != id);
        self.last_persist = self.persist();
        self.history.clone()
    }

    /// Empties the history and deletes the persisted key.
    fn clear(&mut self) -> HistoryList {
        self.history.clear();
        self.last_persist = match self.storage.remove_item(HISTORY_KEY) {
            Ok(()) => PersistOutcome::Removed,
            Err(e) => {
                warn!(error = %e, "Failed to delete persisted history");
                PersistOutcome::Abandoned
            }
        };
        Vec::new()
    }
}

/// Drops duplicate ids (first occurrence wins) and caps the length.
fn normalize(list: HistoryList) -> HistoryList {
    let original_len = list.len();
    let mut seen = std::collections::HashSet::new();
    let normalized: HistoryList = list
        .into_iter()
        .filter(|r| seen.insert(r.id))
        .take(MAX_HISTORY_ITEMS)
        .collect();
    if normalized.len() != original_len {
        warn!(
            loaded = original_len,
            kept = normalized.len(),
            "Persisted history violated limits, normalized"
        );
    }
    normalized
}

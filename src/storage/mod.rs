//! Local key-value persistence.
//!
//! [`KeyValueStore`] is the port the history store writes through. It mirrors
//! a browser's local storage: string keys, string values, and a byte budget
//! shared by every key. Writes that would exceed the budget fail with
//! [`StorageError::QuotaExceeded`] and leave the previous value in place.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::types::errors::StorageError;

/// String key-value storage with an optional quota.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `None` when absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Deletes `key`. Deleting an absent key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Bytes a single entry counts against the quota.
pub fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Checks that writing `key`/`value` fits once `used_by_others` bytes are
/// already taken by other keys.
pub fn check_quota(
    quota: Option<usize>,
    used_by_others: usize,
    key: &str,
    value: &str,
) -> Result<(), StorageError> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let requested = entry_size(key, value);
    let available = quota.saturating_sub(used_by_others);
    if requested > available {
        return Err(StorageError::QuotaExceeded {
            requested,
            available,
        });
    }
    Ok(())
}

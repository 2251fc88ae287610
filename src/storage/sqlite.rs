//! SQLite-backed key-value store.
//!
//! Values live in the `kv_store` table created by the V1 migration. The quota
//! is enforced by summing the byte length of every other row before a write,
//! so behavior matches [`super::MemoryStore`] for the same budget.

use std::path::Path;

use rusqlite::{params, OptionalExtension};

use super::{check_quota, KeyValueStore};
use crate::database::Database;
use crate::types::errors::StorageError;

/// Key-value store persisted in SQLite.
pub struct SqliteStore {
    db: Database,
    quota: Option<usize>,
}

impl SqliteStore {
    /// Wraps an already opened database.
    pub fn new(db: Database, quota: Option<usize>) -> Self {
        Self { db, quota }
    }

    /// Opens (or creates) the database file at `path`, creating parent
    /// directories as needed.
    pub fn open<P: AsRef<Path>>(path: P, quota: Option<usize>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Unavailable(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let db = Database::open(path).map_err(|e| {
            StorageError::Unavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self::new(db, quota))
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory(quota: Option<usize>) -> Result<Self, StorageError> {
        let db = Database::open_in_memory()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(Self::new(db, quota))
    }

    pub fn quota(&self) -> Option<usize> {
        self.quota
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Total bytes counted against the quota.
    pub fn used_bytes(&self) -> Result<usize, StorageError> {
        self.used_bytes_excluding(None)
    }

    fn used_bytes_excluding(&self, key: Option<&str>) -> Result<usize, StorageError> {
        let used: i64 = self.db.connection().query_row(
            "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0) \
             FROM kv_store WHERE ?1 IS NULL OR key != ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as usize)
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.quota.is_some() {
            let used_by_others = self.used_bytes_excluding(Some(key))?;
            check_quota(self.quota, used_by_others, key, value)?;
        }
        let now = chrono::Utc::now().timestamp();
        self.db.connection().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

//! SQLite file backing the persistent key-value store.
//!
//! A [`Database`] is only handed out after [`migrations::run_all`] succeeded,
//! so `kv_store` always exists for [`crate::storage::SqliteStore`].

pub mod migrations;

use std::path::Path;

use rusqlite::Connection;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens or creates the database at `path`. The parent directory must
    /// already exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        Self::migrated(Connection::open(path)?)
    }

    /// Private database that disappears when dropped.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self, rusqlite::Error> {
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

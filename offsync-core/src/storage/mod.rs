// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Queue Store
//!
//! Durable key-value store backing the pending-message queue and the last
//! known connectivity record. Uses SQLite so that the foreground client and
//! the background worker can open the same file concurrently.
//!
//! Every record is stored as `{id, value, timestamp}` where `value` is JSON.
//! The `try_*` operations return `Result`; the plain operations follow the
//! best-effort policy: they log failures and resolve to `false` / `None`.

mod connectivity;
mod error;
pub mod migration;
mod pending;

pub use connectivity::{ConnectivityRecord, CONNECTION_STATUS_KEY};
pub use error::StorageError;
pub use pending::{PendingMessage, PENDING_MESSAGES_KEY};

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// How long a writer waits for another context's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A raw stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Logical slot name.
    pub id: String,
    /// JSON value.
    pub value: serde_json::Value,
    /// Write time (milliseconds since the Unix epoch).
    pub timestamp: u64,
}

/// SQLite-based queue store.
pub struct QueueStore {
    conn: Mutex<Connection>,
}

impl QueueStore {
    /// Opens or creates a store database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::from_connection(conn)
    }

    /// Creates an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        migration::MigrationRunner::run(&conn, &migration::all_migrations())?;
        Ok(QueueStore {
            conn: Mutex::new(conn),
        })
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migration::MigrationRunner::current_version(&self.conn.lock())
    }

    // === Record Operations ===

    /// Upserts a record, stamping the write time.
    pub fn try_put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO records (id, value, timestamp) VALUES (?1, ?2, ?3)",
            params![key, json, crate::now_millis() as i64],
        )?;
        Ok(())
    }

    /// Loads the raw record stored under `key`.
    pub fn try_record(&self, key: &str) -> Result<Option<StoredRecord>, StorageError> {
        let row = self
            .conn
            .lock()
            .query_row(
                "SELECT id, value, timestamp FROM records WHERE id = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, value, timestamp)) => Ok(Some(StoredRecord {
                id,
                value: serde_json::from_str(&value)?,
                timestamp: timestamp as u64,
            })),
            None => Ok(None),
        }
    }

    /// Loads and decodes the value stored under `key`.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.try_record(key)? {
            Some(record) => Ok(Some(serde_json::from_value(record.value)?)),
            None => Ok(None),
        }
    }

    /// Upserts a record. Returns `false` (and logs) on failure.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_put(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to store record");
                false
            }
        }
    }

    /// Returns the value under `key`, or `None` when absent or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to read record");
                None
            }
        }
    }

    /// Removes the record under `key`.
    pub fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let rows_affected = self
            .conn
            .lock()
            .execute("DELETE FROM records WHERE id = ?1", params![key])?;
        Ok(rows_affected > 0)
    }

    /// Runs a read-modify-write of the JSON value under `key` inside one
    /// immediate transaction.
    ///
    /// The write lock is taken before the read, so concurrent writers in other
    /// contexts are serialized instead of overwriting each other.
    pub(crate) fn update<T, R, F>(&self, key: &str, f: F) -> Result<R, StorageError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> R,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<String> = tx
            .query_row(
                "SELECT value FROM records WHERE id = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        let mut value: T = match current {
            Some(json) => serde_json::from_str(&json)?,
            None => T::default(),
        };

        let result = f(&mut value);

        tx.execute(
            "INSERT OR REPLACE INTO records (id, value, timestamp) VALUES (?1, ?2, ?3)",
            params![key, serde_json::to_string(&value)?, crate::now_millis() as i64],
        )?;
        tx.commit()?;

        Ok(result)
    }
}

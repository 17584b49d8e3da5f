//! SQLite option store implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::models::*;

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("corrupt option {name}: {source}")]
    Corrupt {
        name: String,
        source: serde_json::Error,
    },
    #[error("connection lock poisoned")]
    Poisoned,
}

/// Thread-safe option store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create a store that lives only as long as the process.
    pub fn in_memory() -> Result<Self, DbError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DbError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    // --- Raw options ---

    /// Read an option, `None` when it was never written or was deleted.
    pub fn get_option(&self, name: &str) -> Result<Option<String>, DbError> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM options WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite an option.
    pub fn set_option(&self, name: &str, value: &str) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO options (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value=excluded.value",
            params![name, value],
        )?;
        Ok(())
    }

    /// Delete an option. Deleting a missing option is not an error.
    pub fn delete_option(&self, name: &str) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM options WHERE name = ?1", params![name])?;
        Ok(())
    }

    /// Number of stored options.
    pub fn option_count(&self) -> Result<i64, DbError> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM options", [], |r| r.get(0))?)
    }

    // --- Settings ---

    /// Load the settings record, empty when never saved.
    pub fn get_settings(&self) -> Result<Settings, DbError> {
        match self.get_option(SETTINGS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| DbError::Corrupt {
                name: SETTINGS_KEY.to_string(),
                source,
            }),
            None => Ok(Settings::default()),
        }
    }

    /// Overwrite the whole settings record.
    pub fn save_settings(&self, settings: &Settings) -> Result<(), DbError> {
        let raw = serde_json::to_string(settings).map_err(|source| DbError::Corrupt {
            name: SETTINGS_KEY.to_string(),
            source,
        })?;
        self.set_option(SETTINGS_KEY, &raw)
    }

    // --- Pending test ---

    /// Read the pending test pair.
    pub fn get_pending(&self) -> Result<PendingTest, DbError> {
        let test_id = self.get_option(TEST_ID_KEY)?.unwrap_or_default();
        let action = self.get_option(TEST_ACTION_KEY)?.unwrap_or_default();
        let triggered_at = self
            .get_option(TEST_TRIGGERED_AT_KEY)?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(PendingTest {
            test_id,
            action,
            triggered_at,
        })
    }

    /// Write the pending identifier. An absent identifier is stored as
    /// empty, which leaves nothing pending.
    pub fn set_pending_test_id(&self, test_id: Option<&str>, at: DateTime<Utc>) -> Result<(), DbError> {
        match test_id {
            Some(id) if !id.is_empty() => {
                self.set_option(TEST_ID_KEY, id)?;
                self.set_option(TEST_TRIGGERED_AT_KEY, &at.to_rfc3339())
            }
            _ => {
                self.set_option(TEST_ID_KEY, "")?;
                self.delete_option(TEST_TRIGGERED_AT_KEY)
            }
        }
    }

    /// Write the pending action description.
    pub fn set_pending_action(&self, action: &str) -> Result<(), DbError> {
        self.set_option(TEST_ACTION_KEY, action)
    }

    /// Forget the pending test entirely.
    pub fn clear_pending(&self) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM options WHERE name IN (?1, ?2, ?3)",
            params![TEST_ID_KEY, TEST_ACTION_KEY, TEST_TRIGGERED_AT_KEY],
        )?;
        Ok(())
    }
}

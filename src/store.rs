//! Key-value persistence.
//!
//! Collections are stored as JSON arrays under fixed keys in a one-table
//! SQLite database. The store never raises: a missing backing file, corrupt
//! value, or full disk degrades to defaults or a logged warning so the UI
//! layer keeps working without persistence.
//!
//! Accepted limitation: nothing guards against a second process opening the
//! same file. Writes are last-one-wins with no merge, which is fine for a
//! single-user personal tool.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub struct KvStore {
    conn: Option<Connection>,
}

impl KvStore {
    /// Opens (or creates) the store at `path`. Failure to open degrades to
    /// an unavailable store instead of an error.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        match Self::try_open(path) {
            Ok(store) => store,
            Err(err) => {
                log::warn!(
                    "storage unavailable, data will not persist ({}): {err:#}",
                    path.display()
                );
                Self::unavailable()
            }
        }
    }

    /// Fresh private store, used by tests and previews.
    #[must_use]
    pub fn in_memory() -> Self {
        match Connection::open_in_memory()
            .map_err(anyhow::Error::from)
            .and_then(Self::init)
        {
            Ok(store) => store,
            Err(err) => {
                log::warn!("in-memory storage unavailable: {err:#}");
                Self::unavailable()
            }
        }
    }

    /// A store with no backing at all: reads return defaults, writes no-op.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { conn: None }
    }

    fn try_open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open store: {}", path.display()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL);")
            .context("failed to create kv table")?;
        Ok(Self { conn: Some(conn) })
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    /// Deserialized value at `key`, or `default` when the key is absent, the
    /// store is unavailable, or the stored value does not parse.
    pub fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(conn) = &self.conn else {
            return default;
        };
        let raw: Option<String> = match conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("failed to read key {key}: {err}");
                return default;
            }
        };
        match raw {
            None => default,
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("discarding corrupt value under key {key}: {err}");
                    default
                }
            },
        }
    }

    /// Serializes and persists `value` under `key`. Best-effort: a failed
    /// write is logged and the previously persisted state stays intact.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) {
        let Some(conn) = &self.conn else {
            return;
        };
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                log::error!("failed to serialize value for key {key}: {err}");
                return;
            }
        };
        let result = conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, json],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::DiskFull =>
            {
                log::warn!("storage is full; delete old data to keep saving ({key} not written)");
            }
            Err(err) => {
                log::error!("failed to write key {key}: {err}");
            }
        }
    }

    /// Drops `key`. No-op when absent or unavailable.
    pub fn remove(&self, key: &str) {
        let Some(conn) = &self.conn else {
            return;
        };
        if let Err(err) = conn.execute("DELETE FROM kv WHERE key = ?1", params![key]) {
            log::error!("failed to remove key {key}: {err}");
        }
    }

    /// Total bytes of keys plus values currently persisted.
    #[must_use]
    pub fn usage_bytes(&self) -> u64 {
        let Some(conn) = &self.conn else {
            return 0;
        };
        conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(key) + LENGTH(value)), 0) FROM kv",
            [],
            |row| row.get::<_, i64>(0),
        )
        .ok()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
    }
}

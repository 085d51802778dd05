//! SQLite write-through mirror (feature `sqlite`).
//!
//! One table holds every mirrored document:
//!
//! ```sql
//! kv(key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at TEXT NOT NULL)
//! ```

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};

use evac_core::now;

use crate::RegistryResult;
use crate::mirror::StateMirror;

/// Mirrors registry state into an SQLite database.
pub struct SqliteMirror {
    conn: Mutex<Connection>,
}

impl SqliteMirror {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> RegistryResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )?;
        Self::with_connection(conn)
    }

    /// A private in-memory database.
    pub fn in_memory() -> RegistryResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> RegistryResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                 key        TEXT PRIMARY KEY,
                 value      TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             );",
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn get(&self, key: &str) -> RegistryResult<Option<String>> {
        let value = self
            .conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn len(&self) -> RegistryResult<usize> {
        let n: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl StateMirror for SqliteMirror {
    fn put(&self, key: &str, value: &str) -> RegistryResult<()> {
        self.conn.lock().execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> RegistryResult<()> {
        self.conn.lock().execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

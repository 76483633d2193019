//! SQLite-backed key/value storage.

use super::backend::{BackendError, BackendResult, KvBackend};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Backend handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets several processes share one store file
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )?;

        let backend = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        backend.run_migrations()?;

        Ok(backend)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let backend = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        backend.run_migrations()?;

        Ok(backend)
    }

    fn run_migrations(&self) -> Result<()> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite connection lock poisoned"))?;
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    fn with_conn<F, T>(&self, f: F) -> BackendResult<T>
    where
        F: FnOnce(&Connection) -> BackendResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| BackendError::Poisoned)?;
        f(&conn)
    }
}

impl KvBackend for SqliteBackend {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.with_conn(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> BackendResult<bool> {
        self.with_conn(|conn| {
            let entries = conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
            let members =
                conn.execute("DELETE FROM kv_set_members WHERE set_key = ?1", params![key])?;
            Ok(entries + members > 0)
        })
    }

    fn exists(&self, key: &str) -> BackendResult<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM kv_entries WHERE key = ?1)
                     OR EXISTS(SELECT 1 FROM kv_set_members WHERE set_key = ?1)",
                params![key],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn set_add(&self, key: &str, member: &str) -> BackendResult<()> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO kv_set_members (set_key, member, added_at) VALUES (?1, ?2, ?3)",
                params![key, member, now],
            )?;
            Ok(())
        })
    }

    fn set_remove(&self, key: &str, member: &str) -> BackendResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM kv_set_members WHERE set_key = ?1 AND member = ?2",
                params![key, member],
            )?;
            Ok(())
        })
    }

    fn set_members(&self, key: &str) -> BackendResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT member FROM kv_set_members WHERE set_key = ?1 ORDER BY member",
            )?;
            let members = stmt
                .query_map(params![key], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(members)
        })
    }

    fn keys_with_prefix(&self, prefix: &str) -> BackendResult<Vec<String>> {
        // substr() instead of LIKE so '%' and '_' in keys are not wildcards
        let len = prefix.chars().count() as i64;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key FROM kv_entries WHERE substr(key, 1, ?2) = ?1
                 UNION
                 SELECT DISTINCT set_key FROM kv_set_members WHERE substr(set_key, 1, ?2) = ?1
                 ORDER BY 1",
            )?;
            let keys = stmt
                .query_map(params![prefix, len], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(keys)
        })
    }
}

/// Get the current timestamp in milliseconds.
fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

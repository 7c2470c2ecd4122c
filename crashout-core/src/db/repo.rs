//! Database repository layer
//!
//! Snapshot reads and writes keyed by name.

use crate::error::{Error, Result};
use crate::store::KeyValueStore;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.connection()?;
        super::schema::run_migrations(&mut conn)
    }

    /// Lock the underlying connection.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("database connection lock poisoned".to_string()))
    }

    /// List stored snapshot keys with their last write time (RFC 3339).
    pub fn snapshot_keys(&self) -> Result<Vec<(String, String)>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT key, updated_at FROM snapshots ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl KeyValueStore for Database {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        let value = conn
            .query_row(
                "SELECT value FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO snapshots (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        tracing::trace!(key, bytes = value.len(), "Snapshot saved");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM snapshots WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{HISTORY_KEY, USER_KEY};

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn test_save_overwrites_snapshot() {
        let db = test_db();
        db.save(HISTORY_KEY, "[]").unwrap();
        db.save(HISTORY_KEY, "[1]").unwrap();
        assert_eq!(db.load(HISTORY_KEY).unwrap().as_deref(), Some("[1]"));
        assert_eq!(db.snapshot_keys().unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_key() {
        let db = test_db();
        assert!(db.load(USER_KEY).unwrap().is_none());
    }

    #[test]
    fn test_remove_snapshot() {
        let db = test_db();
        db.save(USER_KEY, "{}").unwrap();
        db.remove(USER_KEY).unwrap();
        assert!(db.load(USER_KEY).unwrap().is_none());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/crashout.db");
        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        db.save(USER_KEY, "{}").unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        reopened.migrate().unwrap();
        assert_eq!(reopened.load(USER_KEY).unwrap().as_deref(), Some("{}"));
    }
}

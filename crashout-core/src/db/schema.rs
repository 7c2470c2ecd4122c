//! Snapshot schema, versioned through `PRAGMA user_version`.

use crate::error::Result;
use rusqlite::Connection;

/// Version the database ends up at after [`run_migrations`].
pub const SCHEMA_VERSION: i32 = 1;

/// Migration `n` upgrades a database from version `n` to `n + 1`.
const MIGRATIONS: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS snapshots (
        key         TEXT PRIMARY KEY,
        value       TEXT NOT NULL,
        updated_at  DATETIME NOT NULL
    );
    "#];

/// Apply every migration newer than the stored version, each in its own transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let from = get_schema_version(conn)?;
    if from >= SCHEMA_VERSION {
        tracing::debug!(version = from, "Snapshot schema up to date");
        return Ok(());
    }

    for (version, sql) in (1..).zip(MIGRATIONS.iter()).skip(from.max(0) as usize) {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        tracing::info!(version, "Applied snapshot migration");
    }

    Ok(())
}

/// Read the stored schema version (0 for a fresh database).
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

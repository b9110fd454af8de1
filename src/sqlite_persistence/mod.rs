//! Versioned SQLite schema machinery shared by the store.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Offset applied to `PRAGMA user_version` so a cliptube database is
/// distinguishable from an unrelated SQLite file.
pub const BASE_DB_VERSION: usize = 4000;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        for table in self.tables {
            conn.execute(table.schema, [])
                .with_context(|| format!("Failed to create table {}", table.name))?;
            for index in table.indices {
                conn.execute(index, [])?;
            }
        }
        conn.pragma_update(None, "user_version", BASE_DB_VERSION + self.version)?;
        Ok(())
    }
}

/// Open (or create) the database at `db_path` and bring it up to the
/// latest schema version.
pub fn open_database<P: AsRef<Path>>(
    db_path: P,
    schemas: &'static [VersionedSchema],
) -> Result<Connection> {
    let existed = db_path.as_ref().exists();
    let mut conn = Connection::open_with_flags(
        db_path.as_ref(),
        rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
            | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
            | rusqlite::OpenFlags::SQLITE_OPEN_URI
            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database at {:?}", db_path.as_ref()))?;

    conn.pragma_update(None, "journal_mode", "WAL")
        .context("Failed to set WAL mode")?;
    conn.execute("PRAGMA foreign_keys = ON;", [])?;

    let latest = schemas.last().expect("at least one schema version");
    if !existed {
        info!("Creating database schema at version {}", latest.version);
        latest.create(&conn)?;
        return Ok(conn);
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if (db_version as usize) < BASE_DB_VERSION {
        bail!("Database at version {} is not a cliptube database", db_version);
    }
    let current = db_version as usize - BASE_DB_VERSION;
    if current > latest.version {
        bail!("Database version {} is too new", current);
    }
    if current < latest.version {
        migrate(&mut conn, schemas, current)?;
    }
    Ok(conn)
}

fn migrate(
    conn: &mut Connection,
    schemas: &'static [VersionedSchema],
    from: usize,
) -> Result<()> {
    let tx = conn.transaction()?;
    let mut current = from;
    for schema in schemas.iter().skip(from + 1) {
        if let Some(migration_fn) = schema.migration {
            info!("Migrating database from version {} to {}", current, schema.version);
            migration_fn(&tx)?;
            current = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current)?;
    tx.commit()?;
    Ok(())
}

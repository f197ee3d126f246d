//! Database operations for SQLite.
//!
//! This module handles connections, schema creation and the per-unit
//! transaction scope used by the loader.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info, warn};

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    ///
    /// The schema is created on first open. Existing tables are left as they
    /// are; there are no migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        debug!(path = %path.display(), "Opening database");

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create the eight tables if they do not exist yet
    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(include_str!("../schema.sql"))
            .context("Failed to create database schema")?;

        debug!("Database schema ready");
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Check if a table exists
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Count the rows of a table
    pub fn row_count(&self, table_name: &str) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", table_name),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Begin the transaction that scopes one (year, season) unit
    pub fn begin_unit(self) -> Result<UnitSession> {
        self.conn
            .execute_batch("BEGIN")
            .context("Failed to begin transaction")?;

        Ok(UnitSession {
            db: self,
            in_transaction: true,
        })
    }
}

/// One unit's connection, held inside an open transaction
///
/// `commit` makes the unit's rows durable and closes the connection. Dropping
/// the session any other way (an error, a panic, cancellation) rolls the
/// transaction back before the connection closes.
pub struct UnitSession {
    db: Database,
    in_transaction: bool,
}

impl UnitSession {
    /// Open the database file and begin a unit transaction
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Database::open(path)?.begin_unit()
    }

    pub fn conn(&self) -> &Connection {
        self.db.conn()
    }

    /// Commit the unit and close the connection
    pub fn commit(mut self) -> Result<()> {
        self.db
            .conn
            .execute_batch("COMMIT")
            .context("Failed to commit unit transaction")?;
        self.in_transaction = false;

        info!("Unit committed");
        Ok(())
    }

    /// Discard the unit and close the connection
    pub fn rollback(mut self) -> Result<()> {
        self.db
            .conn
            .execute_batch("ROLLBACK")
            .context("Failed to roll back unit transaction")?;
        self.in_transaction = false;

        debug!("Unit rolled back");
        Ok(())
    }
}

impl Drop for UnitSession {
    fn drop(&mut self) {
        if !self.in_transaction {
            return;
        }

        match self.db.conn.execute_batch("ROLLBACK") {
            Ok(()) => warn!("Unit closed without commit, rolled back"),
            Err(e) => warn!(error = %e, "Failed to roll back unit on close"),
        }
    }
}

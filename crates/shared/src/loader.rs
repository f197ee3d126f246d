//! Row loader.
//!
//! Inserts projection rows one statement at a time. A duplicate primary key
//! is an expected outcome when a season is loaded again, so it is reported
//! as `DuplicateSkipped` rather than an error.

use crate::models::{Table, TableRow};
use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{ffi, params_from_iter, Connection, ErrorCode};
use tracing::{debug, warn};

/// Result of inserting a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    DuplicateSkipped,
    /// The row did not fit the table (column count, datatype, CHECK)
    Rejected(String),
}

/// Per-table (or per-run) insert tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

impl LoadStats {
    pub fn record(&mut self, outcome: &InsertOutcome) {
        match outcome {
            InsertOutcome::Inserted => self.inserted += 1,
            InsertOutcome::DuplicateSkipped => self.duplicates += 1,
            InsertOutcome::Rejected(_) => self.rejected += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.duplicates + self.rejected
    }
}

impl std::ops::AddAssign for LoadStats {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.rejected += other.rejected;
    }
}

/// Insert one positional row into `table`
///
/// The statement is sized to the row, not the table, so a row of the wrong
/// width is rejected by the database instead of being padded or truncated.
/// Errors that say nothing about the row itself (busy, read-only, disk
/// full, I/O) are returned as `Err` so the caller can abandon the unit.
pub fn insert_row(conn: &Connection, table: Table, row: &[Value]) -> Result<InsertOutcome> {
    if row.is_empty() {
        warn!(table = %table, "Rejected empty row");
        return Ok(InsertOutcome::Rejected("row has no columns".to_string()));
    }

    let placeholders = vec!["?"; row.len()].join(", ");
    let sql = format!("INSERT INTO \"{}\" VALUES ({})", table.name(), placeholders);

    match conn.execute(&sql, params_from_iter(row.iter())) {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(err, _)) if is_duplicate_key(&err) => {
            debug!(table = %table, row = ?row, "Row already exists, skipped");
            Ok(InsertOutcome::DuplicateSkipped)
        }
        Err(e) if is_row_error(&e) => {
            warn!(table = %table, row = ?row, error = %e, "Row rejected");
            Ok(InsertOutcome::Rejected(e.to_string()))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to insert into {}", table)),
    }
}

/// Insert every row of one projection, continuing past duplicates and rejects
///
/// Stops at the first error that is not about the row.
pub fn load_projection<R: TableRow>(conn: &Connection, rows: &[R]) -> Result<LoadStats> {
    let mut stats = LoadStats::default();

    for row in rows {
        let outcome = insert_row(conn, R::TABLE, &row.values())?;
        stats.record(&outcome);
    }

    debug!(
        table = %R::TABLE,
        inserted = stats.inserted,
        duplicates = stats.duplicates,
        rejected = stats.rejected,
        "Projection loaded"
    );

    Ok(stats)
}

fn is_duplicate_key(err: &ffi::Error) -> bool {
    err.code == ErrorCode::ConstraintViolation
        && matches!(
            err.extended_code,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
        )
}

/// Failures caused by the row's shape or values
///
/// `SQLITE_ERROR` is what a column-count mismatch surfaces as.
fn is_row_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(err, _) => matches!(
            err.code,
            ErrorCode::ConstraintViolation
                | ErrorCode::TypeMismatch
                | ErrorCode::ParameterOutOfRange
                | ErrorCode::TooBig
        ) || err.extended_code == ffi::SQLITE_ERROR,
        rusqlite::Error::ToSqlConversionFailure(_) | rusqlite::Error::IntegralValueOutOfRange(..) => {
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenreRow, Season, UserRow};
    use crate::Database;
    use rusqlite::OpenFlags;
    use tempfile::TempDir;

    fn genre(label: &str) -> GenreRow {
        GenreRow {
            genre: label.to_string(),
            anime_id: 101,
            season: Season::Fall,
            season_year: 2020,
        }
    }

    #[test]
    fn test_insert_then_duplicate() -> Result<()> {
        let db = Database::open_in_memory()?;
        let row = genre("Action").values();

        assert_eq!(insert_row(db.conn(), Table::Genre, &row)?, InsertOutcome::Inserted);
        assert_eq!(
            insert_row(db.conn(), Table::Genre, &row)?,
            InsertOutcome::DuplicateSkipped
        );
        assert_eq!(db.row_count("Genre")?, 1);

        Ok(())
    }

    #[test]
    fn test_duplicate_on_rowid_primary_key() -> Result<()> {
        let db = Database::open_in_memory()?;
        let user = UserRow {
            user_id: 42,
            username: Some("someone".to_string()),
            donator_tier: Some("0".to_string()),
            donator_badge: Some("Donator".to_string()),
            created_at: None,
            large_avatar: None,
            medium_avatar: None,
        };

        assert_eq!(load_projection(db.conn(), &[user.clone()])?.inserted, 1);
        let stats = load_projection(db.conn(), &[user])?;
        assert_eq!(stats.duplicates, 1);
        assert_eq!(db.row_count("User")?, 1);

        Ok(())
    }

    #[test]
    fn test_wrong_width_is_rejected() -> Result<()> {
        let db = Database::open_in_memory()?;
        let row = vec![Value::Text("Action".to_string()), Value::Integer(101)];

        let outcome = insert_row(db.conn(), Table::Genre, &row)?;
        assert!(matches!(outcome, InsertOutcome::Rejected(_)));
        assert_eq!(db.row_count("Genre")?, 0);

        Ok(())
    }

    #[test]
    fn test_wrong_type_and_check_are_rejected() -> Result<()> {
        let db = Database::open_in_memory()?;

        let bad_type = vec![
            Value::Text("Action".to_string()),
            Value::Text("not-an-id".to_string()),
            Value::Text("FALL".to_string()),
            Value::Integer(2020),
        ];
        assert!(matches!(
            insert_row(db.conn(), Table::Genre, &bad_type)?,
            InsertOutcome::Rejected(_)
        ));

        let mut bad_season = vec![Value::Null; Table::Anime.column_count()];
        bad_season[0] = Value::Integer(1);
        bad_season[1] = Value::Text("AUTUMN".to_string());
        bad_season[2] = Value::Integer(2020);
        assert!(matches!(
            insert_row(db.conn(), Table::Anime, &bad_season)?,
            InsertOutcome::Rejected(_)
        ));

        Ok(())
    }

    #[test]
    fn test_rejected_row_does_not_stop_batch() -> Result<()> {
        let db = Database::open_in_memory()?;
        let rows = [genre("Action"), genre("Action"), genre("Comedy")];

        let stats = load_projection(db.conn(), &rows)?;
        assert_eq!(
            stats,
            LoadStats {
                inserted: 2,
                duplicates: 1,
                rejected: 0
            }
        );
        assert_eq!(stats.total(), 3);

        let mut total = LoadStats::default();
        total += stats;
        total.record(&InsertOutcome::Rejected("x".to_string()));
        assert_eq!(total.rejected, 1);

        Ok(())
    }

    #[test]
    fn test_read_only_database_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");
        drop(Database::open(&db_path)?);

        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let row = genre("Action").values();
        assert!(insert_row(&conn, Table::Genre, &row).is_err());
        assert!(load_projection(&conn, &[genre("Drama")]).is_err());

        Ok(())
    }
}

//! Year × season driver.
//!
//! Runs fetch, normalize and load for one (year, season) unit at a time,
//! then waits out the cooldown before the next. A failure inside a unit is
//! logged and counted; only cancellation ends the run early.

use crate::api::PageSource;
use crate::fetcher::{FetchOutcome, FetchStop, Fetcher, SeasonDataset};
use crate::normalize::{self, Projection};
use anyhow::Result;
use rusqlite::Connection;
use shared::{load_projection, LoadStats, Season, Table, TableRow, UnitSession};
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Statistics for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub units: usize,
    pub units_no_entries: usize,
    pub units_committed: usize,
    /// Pagination stopped early (rate limit or failed request)
    pub units_truncated: usize,
    pub units_failed: usize,
    pub rows: LoadStats,
}

/// How one unit's load ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Committed(LoadStats),
    /// Shutdown was requested before commit; the unit was rolled back
    Cancelled,
}

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Cancellation signal observed between and around units
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Sending half of `Shutdown`
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // No receivers left means the run is already over
        let _ = self.tx.send(true);
    }
}

impl Shutdown {
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested
    ///
    /// Never resolves if the trigger was dropped without firing.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// The ETL driver
pub struct Pipeline<S> {
    fetcher: Fetcher<S>,
    database_path: PathBuf,
    cooldown: Duration,
    shutdown: Shutdown,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(
        fetcher: Fetcher<S>,
        database_path: impl Into<PathBuf>,
        cooldown: Duration,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            fetcher,
            database_path: database_path.into(),
            cooldown,
            shutdown,
        }
    }

    /// Process every season of every year in `years` (end exclusive)
    pub async fn run(&mut self, years: Range<i32>) -> (RunStatus, RunStats) {
        let mut stats = RunStats::default();
        let units: Vec<(i32, Season)> = years
            .flat_map(|year| Season::ALL.into_iter().map(move |season| (year, season)))
            .collect();

        info!(units = units.len(), "Starting seasonal ETL run");

        for (idx, (year, season)) in units.iter().copied().enumerate() {
            if self.shutdown.is_triggered() {
                return self.cancelled(stats);
            }

            info!(
                progress = %format!("{}/{}", idx + 1, units.len()),
                year,
                season = %season,
                "===== Processing unit ====="
            );

            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.wait() => return self.cancelled(stats),
                outcome = self.fetcher.fetch_season(year, season) => outcome,
            };

            stats.units += 1;
            let dataset = match outcome {
                FetchOutcome::NoEntries(quota) => {
                    info!(year, season = %season, quota = %quota, "No anime entries for unit");
                    stats.units_no_entries += 1;
                    None
                }
                FetchOutcome::Dataset(dataset) => Some(dataset),
            };

            if let Some(dataset) = dataset {
                let complete = dataset.stop == FetchStop::Exhausted;
                if !complete {
                    warn!(
                        year,
                        season = %season,
                        pages = dataset.pages,
                        entries = dataset.len(),
                        stop = ?dataset.stop,
                        "Pagination stopped early, unit is incomplete"
                    );
                    stats.units_truncated += 1;
                }

                if dataset.is_empty() {
                    warn!(year, season = %season, "Nothing fetched, unit skipped");
                } else {
                    if self.shutdown.is_triggered() {
                        return self.cancelled(stats);
                    }

                    match self.load_unit(&dataset) {
                        Ok(UnitOutcome::Committed(rows)) => {
                            info!(
                                year,
                                season = %season,
                                inserted = rows.inserted,
                                duplicates = rows.duplicates,
                                rejected = rows.rejected,
                                "{}",
                                if complete {
                                    "All data inserted for unit"
                                } else {
                                    "Partial data inserted for unit"
                                }
                            );
                            stats.units_committed += 1;
                            stats.rows += rows;
                        }
                        Ok(UnitOutcome::Cancelled) => return self.cancelled(stats),
                        Err(e) => {
                            error!(year, season = %season, error = %e, "Unit failed, nothing committed");
                            stats.units_failed += 1;
                        }
                    }
                }
            }

            if idx + 1 < units.len() && !self.cool_down().await {
                return self.cancelled(stats);
            }
        }

        info!("Seasonal ETL run complete");
        (RunStatus::Completed, stats)
    }

    /// Normalize and load one dataset inside a unit transaction
    ///
    /// The session commits only when every projection has been attempted
    /// and no shutdown was requested meanwhile. An error drops the session,
    /// which rolls back.
    pub fn load_unit(&self, dataset: &SeasonDataset) -> Result<UnitOutcome> {
        info!(
            year = dataset.year,
            season = %dataset.season,
            entries = dataset.len(),
            "Inserting data"
        );

        let session = UnitSession::open(&self.database_path)?;
        let rows = load_dataset(session.conn(), dataset)?;

        if self.shutdown.is_triggered() {
            session.rollback()?;
            warn!(
                year = dataset.year,
                season = %dataset.season,
                "Shutdown requested during load, unit rolled back"
            );
            return Ok(UnitOutcome::Cancelled);
        }

        session.commit()?;
        Ok(UnitOutcome::Committed(rows))
    }

    /// Wait out the cooldown; false when cancelled during the wait
    async fn cool_down(&mut self) -> bool {
        if self.cooldown.is_zero() {
            return true;
        }

        info!(seconds = self.cooldown.as_secs(), "Cooldown");
        tokio::select! {
            biased;
            _ = self.shutdown.wait() => false,
            _ = tokio::time::sleep(self.cooldown) => true,
        }
    }

    fn cancelled(&self, stats: RunStats) -> (RunStatus, RunStats) {
        warn!(
            units = stats.units,
            committed = stats.units_committed,
            "Run cancelled"
        );
        (RunStatus::Cancelled, stats)
    }
}

/// Run all eight projections over `dataset` and insert their rows
///
/// Fails on the first database error that is not about a single row.
pub fn load_dataset(conn: &Connection, dataset: &SeasonDataset) -> Result<LoadStats> {
    let mut rows = LoadStats::default();

    for table in Table::ALL {
        rows += match table {
            Table::Anime => load(conn, dataset, normalize::anime(dataset))?,
            Table::Genre => load(conn, dataset, normalize::genres(dataset))?,
            Table::Review => load(conn, dataset, normalize::reviews(dataset))?,
            Table::Status => load(conn, dataset, normalize::status(dataset))?,
            Table::Studio => load(conn, dataset, normalize::studios(dataset))?,
            Table::Tag => load(conn, dataset, normalize::tags(dataset))?,
            Table::User => load(conn, dataset, normalize::users(dataset))?,
            Table::WebAsset => load(conn, dataset, normalize::web_assets(dataset))?,
        };
    }

    Ok(rows)
}

fn load<R: TableRow>(
    conn: &Connection,
    dataset: &SeasonDataset,
    projection: Projection<R>,
) -> Result<LoadStats> {
    let table = R::TABLE;

    let stats = match projection {
        Projection::Rows(rows) => {
            let stats = load_projection(conn, &rows)?;
            if stats.duplicates > 0 {
                info!(
                    table = %table,
                    duplicates = stats.duplicates,
                    "Rows already present, skipped"
                );
            }
            if stats.rejected > 0 {
                warn!(
                    table = %table,
                    year = dataset.year,
                    season = %dataset.season,
                    rejected = stats.rejected,
                    "Rows rejected"
                );
            }
            stats
        }
        Projection::NoData => {
            info!(table = %table, "No data found");
            LoadStats::default()
        }
        Projection::MalformedSchema(detail) => {
            warn!(
                table = %table,
                year = dataset.year,
                season = %dataset.season,
                detail = %detail,
                "Unexpected response shape, table skipped"
            );
            LoadStats::default()
        }
        Projection::Error(detail) => {
            error!(
                table = %table,
                year = dataset.year,
                season = %dataset.season,
                detail = %detail,
                "Failed to preprocess table"
            );
            LoadStats::default()
        }
    };

    Ok(stats)
}

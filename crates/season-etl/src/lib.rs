//! Seasonal AniList ETL.
//!
//! Fetches every anime of a (year, season) unit from the AniList GraphQL
//! API, normalizes the nested records into eight relational projections and
//! loads them into the local database, one transaction per unit.

pub mod api;
pub mod fetcher;
pub mod normalize;
pub mod pipeline;

pub use api::{AniListClient, FetchError, PageSource, Quota};
pub use fetcher::{FetchOutcome, FetchStop, Fetcher, SeasonDataset, PAGE_SIZE};
pub use normalize::Projection;
pub use pipeline::{
    load_dataset, Pipeline, RunStats, RunStatus, Shutdown, ShutdownTrigger, UnitOutcome,
};

//! Nested-to-relational normalization.
//!
//! Each projection reads only the fields it needs from the raw media
//! records of a `SeasonDataset`, unnests nested objects into columns and
//! explodes lists into one row per element. Exploded rows inherit the parent
//! anime's id, season and season year, in source order.

mod collections;
mod media;
mod reviews;

pub use collections::{genres, status, studios, tags};
pub use media::{anime, web_assets};
pub use reviews::{reviews, users};

use crate::fetcher::SeasonDataset;
use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use shared::Season;
use tracing::debug;

/// Result of one projection
#[derive(Debug, Clone, PartialEq)]
pub enum Projection<R> {
    Rows(Vec<R>),
    /// The projection's field is absent, or every list it explodes is empty
    NoData,
    /// A record does not have the shape this projection expects
    MalformedSchema(String),
    /// Any other transformation failure
    Error(String),
}

impl<R> Projection<R> {
    pub fn rows(&self) -> Option<&[R]> {
        match self {
            Projection::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Projection::NoData)
    }
}

/// Identity every row of a media record inherits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MediaContext {
    pub anime_id: i64,
    pub season: Season,
    pub season_year: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaKey {
    id: i64,
    season: Option<Season>,
    season_year: Option<i32>,
}

/// AniList `FuzzyDate`: any part may be null
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct FuzzyDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl FuzzyDate {
    /// A calendar date only when all three parts are present and valid
    pub fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }
}

/// `{ nodes: [...] }` connection wrapper
#[derive(Debug, Deserialize)]
pub(crate) struct Nodes<T> {
    pub nodes: Option<Vec<T>>,
}

impl<T> Nodes<T> {
    pub fn into_vec(self) -> Vec<T> {
        self.nodes.unwrap_or_default()
    }
}

/// Epoch seconds to a UTC calendar date
pub(crate) fn epoch_to_date(seconds: Option<i64>) -> Result<Option<NaiveDate>, String> {
    match seconds {
        None => Ok(None),
        Some(secs) => DateTime::from_timestamp(secs, 0)
            .map(|dt| Some(dt.date_naive()))
            .ok_or_else(|| format!("timestamp {} is out of range", secs)),
    }
}

/// Shared driver for all projections
///
/// `anchor` is the top-level field the projection is built from. When no
/// record carries it the projection has no data; when it is present but a
/// record does not deserialize into `S`, the schema is malformed.
pub(crate) fn project<S, R, F>(
    dataset: &SeasonDataset,
    name: &str,
    anchor: &str,
    mut explode: F,
) -> Projection<R>
where
    S: DeserializeOwned,
    F: FnMut(&MediaContext, S) -> Result<Vec<R>, String>,
{
    if !dataset.media.iter().any(|m| m.get(anchor).is_some()) {
        debug!(projection = name, anchor, "Field absent from every record");
        return Projection::NoData;
    }

    let mut rows = Vec::new();
    for (index, media) in dataset.media.iter().enumerate() {
        let context = match media_context(media, dataset) {
            Ok(context) => context,
            Err(e) => return Projection::MalformedSchema(format!("record {}: {}", index, e)),
        };

        let source = match S::deserialize(media) {
            Ok(source) => source,
            Err(e) => {
                return Projection::MalformedSchema(format!(
                    "record {} (anime {}): {}",
                    index, context.anime_id, e
                ))
            }
        };

        match explode(&context, source) {
            Ok(exploded) => rows.extend(exploded),
            Err(e) => {
                return Projection::Error(format!("anime {}: {}", context.anime_id, e));
            }
        }
    }

    if rows.is_empty() {
        debug!(projection = name, "No rows after unnesting");
        return Projection::NoData;
    }

    Projection::Rows(rows)
}

fn media_context(media: &Value, dataset: &SeasonDataset) -> Result<MediaContext, serde_json::Error> {
    let key = MediaKey::deserialize(media)?;
    Ok(MediaContext {
        anime_id: key.id,
        season: key.season.unwrap_or(dataset.season),
        season_year: key.season_year.unwrap_or(dataset.year),
    })
}

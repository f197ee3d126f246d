//! Row models for the eight relational tables.
//!
//! Each row struct lists its fields in the same order as the columns of its
//! table, and `TableRow::values` binds them in that order.

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Airing season, as used by AniList and the `Season` columns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Seasons in calendar order, the order units are processed in
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "WINTER",
            Season::Spring => "SPRING",
            Season::Summer => "SUMMER",
            Season::Fall => "FALL",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Season {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WINTER" => Ok(Season::Winter),
            "SPRING" => Ok(Season::Spring),
            "SUMMER" => Ok(Season::Summer),
            "FALL" => Ok(Season::Fall),
            _ => Err(anyhow::anyhow!("Invalid season: {}", s)),
        }
    }
}

/// Destination tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Anime,
    Genre,
    Review,
    Status,
    Studio,
    Tag,
    User,
    WebAsset,
}

impl Table {
    /// Load order used by the pipeline
    pub const ALL: [Table; 8] = [
        Table::Anime,
        Table::Genre,
        Table::Review,
        Table::Status,
        Table::Studio,
        Table::Tag,
        Table::User,
        Table::WebAsset,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Anime => "Anime",
            Table::Genre => "Genre",
            Table::Review => "Review",
            Table::Status => "Status",
            Table::Studio => "Studio",
            Table::Tag => "Tag",
            Table::User => "User",
            Table::WebAsset => "WebAsset",
        }
    }

    /// Number of columns in the table
    pub fn column_count(&self) -> usize {
        match self {
            Table::Anime => 14,
            Table::Genre => 4,
            Table::Review => 11,
            Table::Status => 5,
            Table::Studio => 5,
            Table::Tag => 7,
            Table::User => 7,
            Table::WebAsset => 10,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A row that can be bound positionally into its table
pub trait TableRow {
    const TABLE: Table;

    /// Column values in table order
    fn values(&self) -> Vec<Value>;
}

fn text(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::Text)
}

fn int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

fn date(value: Option<NaiveDate>) -> Value {
    value.map_or(Value::Null, |d| Value::Text(d.format("%Y-%m-%d").to_string()))
}

/// `Anime` table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimeRow {
    pub anime_id: i64,
    pub season: Season,
    pub season_year: i32,
    pub english_title: Option<String>,
    pub native_title: Option<String>,
    pub romaji_title: Option<String>,
    pub format: Option<String>,
    pub mean_score: Option<i64>,
    pub popularity: Option<i64>,
    pub episodes: Option<i64>,
    pub favourites: Option<i64>,
    pub duration: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TableRow for AnimeRow {
    const TABLE: Table = Table::Anime;

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.anime_id),
            Value::Text(self.season.to_string()),
            Value::Integer(self.season_year.into()),
            text(&self.english_title),
            text(&self.native_title),
            text(&self.romaji_title),
            text(&self.format),
            int(self.mean_score),
            int(self.popularity),
            int(self.episodes),
            int(self.favourites),
            int(self.duration),
            date(self.start_date),
            date(self.end_date),
        ]
    }
}

/// `Genre` table row: one genre label attached to one anime
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreRow {
    pub genre: String,
    pub anime_id: i64,
    pub season: Season,
    pub season_year: i32,
}

impl TableRow for GenreRow {
    const TABLE: Table = Table::Genre;

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.genre.clone()),
            Value::Integer(self.anime_id),
            Value::Text(self.season.to_string()),
            Value::Integer(self.season_year.into()),
        ]
    }
}

/// `Tag` table row
///
/// Keyed by `tag_id` alone, so a tag shared by several anime keeps only the
/// first anime it was loaded with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRow {
    pub tag_id: i64,
    pub is_adult: Option<bool>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub anime_id: i64,
    pub season: Season,
    pub season_year: i32,
}

impl TableRow for TagRow {
    const TABLE: Table = Table::Tag;

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.tag_id),
            int(self.is_adult.map(i64::from)),
            text(&self.category),
            text(&self.description),
            Value::Integer(self.anime_id),
            Value::Text(self.season.to_string()),
            Value::Integer(self.season_year.into()),
        ]
    }
}

/// `Studio` table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudioRow {
    pub anime_id: i64,
    pub season: Season,
    pub season_year: i32,
    pub studio_id: i64,
    pub studio_name: Option<String>,
}

impl TableRow for StudioRow {
    const TABLE: Table = Table::Studio;

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.anime_id),
            Value::Text(self.season.to_string()),
            Value::Integer(self.season_year.into()),
            Value::Integer(self.studio_id),
            text(&self.studio_name),
        ]
    }
}

/// `Review` table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    pub review_id: i64,
    pub rating: Option<i64>,
    pub rating_amount: Option<i64>,
    pub body: Option<String>,
    pub summary: Option<String>,
    pub created_at: Option<NaiveDate>,
    pub updated_at: Option<NaiveDate>,
    pub anime_id: i64,
    pub season: Season,
    pub season_year: i32,
    pub user_id: Option<i64>,
}

impl TableRow for ReviewRow {
    const TABLE: Table = Table::Review;

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.review_id),
            int(self.rating),
            int(self.rating_amount),
            text(&self.body),
            text(&self.summary),
            date(self.created_at),
            date(self.updated_at),
            Value::Integer(self.anime_id),
            Value::Text(self.season.to_string()),
            Value::Integer(self.season_year.into()),
            int(self.user_id),
        ]
    }
}

/// `User` table row, projected from a review author
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub user_id: i64,
    pub username: Option<String>,
    pub donator_tier: Option<String>,
    pub donator_badge: Option<String>,
    pub created_at: Option<NaiveDate>,
    pub large_avatar: Option<String>,
    pub medium_avatar: Option<String>,
}

impl TableRow for UserRow {
    const TABLE: Table = Table::User;

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.user_id),
            text(&self.username),
            text(&self.donator_tier),
            text(&self.donator_badge),
            date(self.created_at),
            text(&self.large_avatar),
            text(&self.medium_avatar),
        ]
    }
}

/// `WebAsset` table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebAssetRow {
    pub anime_id: i64,
    pub season: Season,
    pub season_year: i32,
    pub banner: Option<String>,
    pub medium_cover: Option<String>,
    pub large_cover: Option<String>,
    pub extra_large_cover: Option<String>,
    pub color: Option<String>,
    pub site_url: Option<String>,
    pub trailer: Option<String>,
}

impl TableRow for WebAssetRow {
    const TABLE: Table = Table::WebAsset;

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.anime_id),
            Value::Text(self.season.to_string()),
            Value::Integer(self.season_year.into()),
            text(&self.banner),
            text(&self.medium_cover),
            text(&self.large_cover),
            text(&self.extra_large_cover),
            text(&self.color),
            text(&self.site_url),
            text(&self.trailer),
        ]
    }
}

/// `Status` table row: how many users hold one list status for an anime
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub anime_id: i64,
    pub season: Season,
    pub season_year: i32,
    pub amount_of_users: Option<i64>,
    pub user_status: String,
}

impl TableRow for StatusRow {
    const TABLE: Table = Table::Status;

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.anime_id),
            Value::Text(self.season.to_string()),
            Value::Integer(self.season_year.into()),
            int(self.amount_of_users),
            Value::Text(self.user_status.clone()),
        ]
    }
}

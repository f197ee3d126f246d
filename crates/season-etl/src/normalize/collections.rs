//! Exploded list projections: `Genre`, `Tag`, `Studio` and `Status`.

use super::{project, MediaContext, Nodes, Projection};
use crate::fetcher::SeasonDataset;
use serde::Deserialize;
use shared::{GenreRow, StatusRow, StudioRow, TagRow};

#[derive(Deserialize)]
struct GenreSource {
    genres: Option<Vec<String>>,
}

/// `Genre` projection: one row per genre label per anime
pub fn genres(dataset: &SeasonDataset) -> Projection<GenreRow> {
    project(dataset, "genres", "genres", |ctx: &MediaContext, source: GenreSource| {
        Ok(source
            .genres
            .unwrap_or_default()
            .into_iter()
            .map(|genre| GenreRow {
                genre,
                anime_id: ctx.anime_id,
                season: ctx.season,
                season_year: ctx.season_year,
            })
            .collect())
    })
}

#[derive(Deserialize)]
struct TagSource {
    tags: Option<Vec<TagNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagNode {
    id: i64,
    is_adult: Option<bool>,
    category: Option<String>,
    description: Option<String>,
}

/// `Tag` projection: one row per tag attached to an anime
pub fn tags(dataset: &SeasonDataset) -> Projection<TagRow> {
    project(dataset, "tags", "tags", |ctx: &MediaContext, source: TagSource| {
        Ok(source
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|tag| TagRow {
                tag_id: tag.id,
                is_adult: tag.is_adult,
                category: tag.category,
                description: tag.description,
                anime_id: ctx.anime_id,
                season: ctx.season,
                season_year: ctx.season_year,
            })
            .collect())
    })
}

#[derive(Deserialize)]
struct StudioSource {
    studios: Option<Nodes<StudioNode>>,
}

#[derive(Deserialize)]
struct StudioNode {
    id: i64,
    name: Option<String>,
}

/// `Studio` projection: one row per studio credited on an anime
pub fn studios(dataset: &SeasonDataset) -> Projection<StudioRow> {
    project(dataset, "studios", "studios", |ctx: &MediaContext, source: StudioSource| {
        Ok(source
            .studios
            .map(Nodes::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|studio| StudioRow {
                anime_id: ctx.anime_id,
                season: ctx.season,
                season_year: ctx.season_year,
                studio_id: studio.id,
                studio_name: studio.name,
            })
            .collect())
    })
}

#[derive(Deserialize)]
struct StatsSource {
    stats: Option<Stats>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    status_distribution: Option<Vec<StatusCount>>,
}

#[derive(Deserialize)]
struct StatusCount {
    status: Option<String>,
    amount: Option<i64>,
}

/// `Status` projection: the user list-status distribution of each anime
///
/// Entries without a status are dropped; the status is part of the key.
pub fn status(dataset: &SeasonDataset) -> Projection<StatusRow> {
    project(dataset, "status", "stats", |ctx: &MediaContext, source: StatsSource| {
        Ok(source
            .stats
            .and_then(|stats| stats.status_distribution)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|count| {
                Some(StatusRow {
                    anime_id: ctx.anime_id,
                    season: ctx.season,
                    season_year: ctx.season_year,
                    amount_of_users: count.amount,
                    user_status: count.status?,
                })
            })
            .collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::Season;

    fn dataset(media: Vec<serde_json::Value>) -> SeasonDataset {
        SeasonDataset::new(2020, Season::Fall, media)
    }

    #[test]
    fn test_genres_explode_in_order() {
        let dataset = dataset(vec![json!({
            "id": 101,
            "season": "FALL",
            "seasonYear": 2020,
            "genres": ["Action", "Comedy"]
        })]);

        let rows = match genres(&dataset) {
            Projection::Rows(rows) => rows,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(
            rows,
            vec![
                GenreRow {
                    genre: "Action".to_string(),
                    anime_id: 101,
                    season: Season::Fall,
                    season_year: 2020,
                },
                GenreRow {
                    genre: "Comedy".to_string(),
                    anime_id: 101,
                    season: Season::Fall,
                    season_year: 2020,
                },
            ]
        );
    }

    #[test]
    fn test_genres_are_deterministic() {
        let record = json!({ "id": 7, "season": "FALL", "seasonYear": 2020, "genres": ["Drama", "Romance", "Slice of Life"] });
        let first = genres(&dataset(vec![record.clone()]));
        let second = genres(&dataset(vec![record]));
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_genre_lists_are_no_data() {
        let dataset = dataset(vec![
            json!({ "id": 1, "season": "FALL", "seasonYear": 2020, "genres": [] }),
            json!({ "id": 2, "season": "FALL", "seasonYear": 2020, "genres": null }),
        ]);

        assert!(genres(&dataset).is_no_data());
    }

    #[test]
    fn test_genres_wrong_shape_is_malformed() {
        let dataset = dataset(vec![json!({ "id": 1, "genres": "Action" })]);
        assert!(matches!(genres(&dataset), Projection::MalformedSchema(_)));
    }

    #[test]
    fn test_tags() {
        let dataset = dataset(vec![json!({
            "id": 101,
            "season": "FALL",
            "seasonYear": 2020,
            "tags": [
                { "id": 29, "isAdult": false, "category": "Theme-Comedy", "description": "Jokes." },
                { "id": 85, "isAdult": false, "category": "Setting-Scene", "description": null }
            ]
        })]);

        let projection = tags(&dataset);
        let rows = projection.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tag_id, 29);
        assert_eq!(rows[0].is_adult, Some(false));
        assert_eq!(rows[0].category.as_deref(), Some("Theme-Comedy"));
        assert_eq!(rows[1].description, None);
        assert!(rows.iter().all(|r| r.anime_id == 101 && r.season == Season::Fall));
    }

    #[test]
    fn test_tag_without_id_is_malformed() {
        let dataset = dataset(vec![json!({
            "id": 101,
            "tags": [{ "isAdult": false, "category": "Theme" }]
        })]);

        assert!(matches!(tags(&dataset), Projection::MalformedSchema(_)));
    }

    #[test]
    fn test_studios_inherit_parent() {
        let dataset = dataset(vec![
            json!({
                "id": 101,
                "season": "FALL",
                "seasonYear": 2020,
                "studios": { "nodes": [{ "id": 11, "name": "Madhouse" }, { "id": 18, "name": "Toei" }] }
            }),
            json!({
                "id": 102,
                "season": "FALL",
                "seasonYear": 2020,
                "studios": { "nodes": [] }
            }),
        ]);

        let projection = studios(&dataset);
        let rows = projection.rows().unwrap();
        let pairs: Vec<(i64, i64)> = rows.iter().map(|r| (r.anime_id, r.studio_id)).collect();
        assert_eq!(pairs, vec![(101, 11), (101, 18)]);
        assert_eq!(rows[1].studio_name.as_deref(), Some("Toei"));
    }

    #[test]
    fn test_status_distribution() {
        let dataset = dataset(vec![json!({
            "id": 101,
            "season": "FALL",
            "seasonYear": 2020,
            "stats": {
                "statusDistribution": [
                    { "status": "CURRENT", "amount": 1200 },
                    { "status": "COMPLETED", "amount": 5400 },
                    { "status": null, "amount": 3 },
                    { "status": "DROPPED", "amount": 210 }
                ]
            }
        })]);

        let projection = status(&dataset);
        let rows = projection.rows().unwrap();
        let statuses: Vec<&str> = rows.iter().map(|r| r.user_status.as_str()).collect();
        assert_eq!(statuses, vec!["CURRENT", "COMPLETED", "DROPPED"]);
        assert_eq!(rows[1].amount_of_users, Some(5400));
    }

    #[test]
    fn test_missing_stats_is_no_data() {
        let dataset = dataset(vec![json!({ "id": 101, "season": "FALL", "seasonYear": 2020 })]);
        assert!(status(&dataset).is_no_data());
    }
}

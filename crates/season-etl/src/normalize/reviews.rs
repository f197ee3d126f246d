//! Review-derived projections: `Review` and `User`.
//!
//! Both read `reviews.nodes`. Users are the review authors, so a season
//! without reviews has no users either.

use super::{epoch_to_date, project, MediaContext, Nodes, Projection};
use crate::fetcher::SeasonDataset;
use serde::Deserialize;
use shared::{ReviewRow, UserRow};

#[derive(Deserialize)]
struct ReviewSource {
    reviews: Option<Nodes<ReviewNode>>,
}

impl ReviewSource {
    fn into_nodes(self) -> Vec<ReviewNode> {
        self.reviews.map(Nodes::into_vec).unwrap_or_default()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewNode {
    id: i64,
    rating: Option<i64>,
    rating_amount: Option<i64>,
    body: Option<String>,
    summary: Option<String>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
    user: Option<ReviewUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewUser {
    id: i64,
    name: Option<String>,
    donator_tier: Option<DonatorTier>,
    donator_badge: Option<String>,
    created_at: Option<i64>,
    avatar: Option<Avatar>,
}

/// AniList sends the tier as an integer; the column is text
#[derive(Deserialize)]
#[serde(untagged)]
enum DonatorTier {
    Level(i64),
    Label(String),
}

impl DonatorTier {
    fn into_text(self) -> String {
        match self {
            DonatorTier::Level(level) => level.to_string(),
            DonatorTier::Label(label) => label,
        }
    }
}

#[derive(Deserialize, Default)]
struct Avatar {
    large: Option<String>,
    medium: Option<String>,
}

/// `Review` projection: one row per review, dated from epoch seconds
pub fn reviews(dataset: &SeasonDataset) -> Projection<ReviewRow> {
    project(dataset, "reviews", "reviews", |ctx: &MediaContext, source: ReviewSource| {
        source
            .into_nodes()
            .into_iter()
            .map(|review| -> Result<ReviewRow, String> {
                Ok(ReviewRow {
                    review_id: review.id,
                    rating: review.rating,
                    rating_amount: review.rating_amount,
                    body: review.body,
                    summary: review.summary,
                    created_at: epoch_to_date(review.created_at)?,
                    updated_at: epoch_to_date(review.updated_at)?,
                    anime_id: ctx.anime_id,
                    season: ctx.season,
                    season_year: ctx.season_year,
                    user_id: review.user.as_ref().map(|user| user.id),
                })
            })
            .collect()
    })
}

/// `User` projection: the author of every review, in review order
///
/// Reviews by deleted accounts carry no user and are skipped. An author of
/// several reviews appears once per review; the primary key folds them.
pub fn users(dataset: &SeasonDataset) -> Projection<UserRow> {
    project(dataset, "users", "reviews", |_: &MediaContext, source: ReviewSource| {
        source
            .into_nodes()
            .into_iter()
            .filter_map(|review| review.user)
            .map(|user| -> Result<UserRow, String> {
                let avatar = user.avatar.unwrap_or_default();
                Ok(UserRow {
                    user_id: user.id,
                    username: user.name,
                    donator_tier: user.donator_tier.map(DonatorTier::into_text),
                    donator_badge: user.donator_badge,
                    created_at: epoch_to_date(user.created_at)?,
                    large_avatar: avatar.large,
                    medium_avatar: avatar.medium,
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use shared::Season;

    fn with_reviews(reviews: serde_json::Value) -> SeasonDataset {
        SeasonDataset::new(
            2014,
            Season::Spring,
            vec![json!({
                "id": 20665,
                "season": "SPRING",
                "seasonYear": 2014,
                "reviews": reviews
            })],
        )
    }

    fn author(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("user{}", id),
            "donatorTier": 2,
            "donatorBadge": "Donator",
            "createdAt": 1396396800,
            "avatar": {
                "large": format!("https://img.example/{}/l.png", id),
                "medium": format!("https://img.example/{}/m.png", id)
            }
        })
    }

    #[test]
    fn test_review_rows() {
        let dataset = with_reviews(json!({
            "nodes": [
                {
                    "id": 5001,
                    "rating": 90,
                    "ratingAmount": 112,
                    "body": "Long review body.",
                    "summary": "Great",
                    "createdAt": 1396396800,
                    "updatedAt": 1396483199,
                    "user": author(77)
                },
                {
                    "id": 5002,
                    "rating": 40,
                    "ratingAmount": 3,
                    "body": "Meh.",
                    "summary": "Meh",
                    "createdAt": 1400000000,
                    "updatedAt": null,
                    "user": null
                }
            ]
        }));

        let rows = match reviews(&dataset) {
            Projection::Rows(rows) => rows,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].review_id, 5001);
        assert_eq!(rows[0].created_at, NaiveDate::from_ymd_opt(2014, 4, 2));
        assert_eq!(rows[0].updated_at, NaiveDate::from_ymd_opt(2014, 4, 2));
        assert_eq!(rows[0].anime_id, 20665);
        assert_eq!(rows[0].user_id, Some(77));
        assert_eq!(rows[1].updated_at, None);
        assert_eq!(rows[1].user_id, None);
    }

    #[test]
    fn test_user_rows() {
        let review = |id: i64, user: serde_json::Value| {
            json!({ "id": id, "createdAt": 1396396800, "updatedAt": 1396396800, "user": user })
        };
        let dataset = with_reviews(json!({
            "nodes": [review(1, author(77)), review(2, json!(null)), review(3, author(78))]
        }));

        let projection = users(&dataset);
        let rows = projection.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, 77);
        assert_eq!(rows[0].username.as_deref(), Some("user77"));
        assert_eq!(rows[0].donator_tier.as_deref(), Some("2"));
        assert_eq!(rows[0].created_at, NaiveDate::from_ymd_opt(2014, 4, 2));
        assert_eq!(rows[0].large_avatar.as_deref(), Some("https://img.example/77/l.png"));
        assert_eq!(rows[1].user_id, 78);
    }

    #[test]
    fn test_zero_reviews_is_no_data() {
        let dataset = with_reviews(json!({ "nodes": [] }));

        assert_eq!(reviews(&dataset), Projection::NoData);
        assert_eq!(users(&dataset), Projection::NoData);
    }

    #[test]
    fn test_absent_reviews_field_is_no_data() {
        let dataset = SeasonDataset::new(
            2014,
            Season::Spring,
            vec![json!({ "id": 1, "season": "SPRING", "seasonYear": 2014, "genres": [] })],
        );

        assert_eq!(reviews(&dataset), Projection::NoData);
        assert_eq!(users(&dataset), Projection::NoData);
    }

    #[test]
    fn test_reviews_wrong_shape_is_malformed() {
        let dataset = with_reviews(json!("none"));

        assert!(matches!(reviews(&dataset), Projection::MalformedSchema(_)));
        assert!(matches!(users(&dataset), Projection::MalformedSchema(_)));
    }

    #[test]
    fn test_out_of_range_timestamp_is_error() {
        let dataset = with_reviews(json!({
            "nodes": [{ "id": 9, "createdAt": i64::MAX, "updatedAt": null, "user": null }]
        }));

        assert!(matches!(reviews(&dataset), Projection::Error(_)));
    }
}

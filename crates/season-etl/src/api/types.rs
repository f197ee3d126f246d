//! AniList request and response types for the seasonal `Page` query.

use super::quota::Quota;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::Season;
use thiserror::Error;

/// One page of one (year, season) unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
    pub season_year: i32,
    pub season: Season,
}

/// GraphQL request body
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: PageVariables,
}

/// Variables bound into the seasonal query
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageVariables {
    pub page: u32,
    pub per_page: u32,
    pub season_year: i32,
    pub season: Season,
    pub sort: &'static str,
    #[serde(rename = "type")]
    pub media_type: &'static str,
}

impl From<&PageRequest> for PageVariables {
    fn from(request: &PageRequest) -> Self {
        Self {
            page: request.page,
            per_page: request.per_page,
            season_year: request.season_year,
            season: request.season,
            sort: "ID",
            media_type: "ANIME",
        }
    }
}

/// GraphQL response wrapper
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    pub status: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PageData {
    #[serde(rename = "Page")]
    pub page: MediaPage,
}

/// `data.Page` of the seasonal query
///
/// Media records stay as raw JSON; the normalizer decides which fields it
/// needs.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPage {
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    pub media: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage", default)]
    pub has_next_page: bool,
}

/// What came back for one page request
#[derive(Debug, Clone)]
pub struct PageReply {
    pub status: StatusCode,
    pub quota: Quota,
    /// Absent when the server throttled the request
    pub page: Option<MediaPage>,
}

impl PageReply {
    pub fn is_throttled(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }
}

/// Transport-level failures that end pagination for a unit
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("GraphQL error: {0}")]
    GraphQl(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variables_shape() {
        let request = PageRequest {
            page: 3,
            per_page: 50,
            season_year: 2014,
            season: Season::Fall,
        };

        let value = serde_json::to_value(PageVariables::from(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "page": 3,
                "perPage": 50,
                "seasonYear": 2014,
                "season": "FALL",
                "sort": "ID",
                "type": "ANIME"
            })
        );
    }

    #[test]
    fn test_parse_page() {
        let body = json!({
            "data": {
                "Page": {
                    "pageInfo": { "currentPage": 1, "hasNextPage": true },
                    "media": [{ "id": 1 }, { "id": 2 }]
                }
            }
        });

        let parsed: GraphQlResponse<PageData> = serde_json::from_value(body).unwrap();
        let page = parsed.data.unwrap().page;
        assert!(page.page_info.has_next_page);
        assert_eq!(page.media.len(), 2);
        assert!(parsed.errors.is_none());
    }

    #[test]
    fn test_parse_errors() {
        let body = json!({
            "data": null,
            "errors": [{ "message": "Too Many Requests.", "status": 429 }]
        });

        let parsed: GraphQlResponse<PageData> = serde_json::from_value(body).unwrap();
        assert!(parsed.data.is_none());
        assert_eq!(parsed.errors.unwrap()[0].status, Some(429));
    }
}

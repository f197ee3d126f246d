//! AniList HTTP client.

use super::quota::Quota;
use super::types::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::AniListConfig;
use std::time::Duration;
use tracing::debug;

/// Source of seasonal media pages
///
/// One call is one request: implementations must not retry or sleep, the
/// fetcher and the pipeline own all pacing.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageReply, FetchError>;
}

/// AniList GraphQL client
pub struct AniListClient {
    /// HTTP client
    client: Client,
    /// GraphQL endpoint
    endpoint: String,
    /// Query document sent with every page request
    query: String,
}

impl AniListClient {
    /// Create a new AniList client
    pub fn new(endpoint: String, query: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("season-etl/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            query,
        })
    }

    /// Build a client from the `[anilist]` config section
    pub fn from_config(config: &AniListConfig) -> Result<Self> {
        let query = config.load_query()?;
        Self::new(
            config.endpoint.clone(),
            query,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PageSource for AniListClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageReply, FetchError> {
        let body = GraphQlRequest {
            query: &self.query,
            variables: PageVariables::from(request),
        };

        debug!(
            endpoint = %self.endpoint,
            page = request.page,
            season = %request.season,
            year = request.season_year,
            "Making API request"
        );

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        let quota = Quota::from_headers(response.headers());

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Ok(PageReply {
                status,
                quota,
                page: None,
            });
        }

        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let parsed: GraphQlResponse<PageData> = serde_json::from_slice(&bytes)?;
        if let Some(errors) = parsed.errors.filter(|errors| !errors.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| match e.status {
                    Some(s) => format!("{} (status {})", e.message, s),
                    None => e.message,
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(FetchError::GraphQl(message));
        }

        let data = parsed
            .data
            .ok_or_else(|| FetchError::GraphQl("response carried no data".to_string()))?;

        Ok(PageReply {
            status,
            quota,
            page: Some(data.page),
        })
    }
}

//! Seasonal pagination.
//!
//! Walks the `Page` query for one (year, season) unit and concatenates the
//! media records of every page. There is no retry: throttling, a low quota
//! or a failed request ends pagination, and whatever was already fetched is
//! returned.

use crate::api::{PageRequest, PageSource, Quota};
use serde_json::Value;
use shared::Season;
use tracing::{debug, info, warn};

/// AniList serves at most 50 media per page
pub const PAGE_SIZE: u32 = 50;

/// Default `X-RateLimit-Remaining` floor
pub const DEFAULT_RATE_LIMIT_FLOOR: u32 = 20;

/// Why pagination ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStop {
    /// The last page said there is no next page, or came back empty
    Exhausted,
    /// HTTP 429, or the remaining quota fell below the floor
    RateLimited,
    /// A request failed; the dataset holds the pages before it
    Failed(String),
}

/// All media records fetched for one (year, season) unit, in page order
#[derive(Debug, Clone)]
pub struct SeasonDataset {
    pub year: i32,
    pub season: Season,
    pub media: Vec<Value>,
    pub pages: u32,
    pub stop: FetchStop,
    pub quota: Quota,
}

impl SeasonDataset {
    /// A fully paginated dataset, mostly useful for feeding the normalizer
    pub fn new(year: i32, season: Season, media: Vec<Value>) -> Self {
        Self {
            year,
            season,
            media,
            pages: 1,
            stop: FetchStop::Exhausted,
            quota: Quota::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}

/// Result of fetching one unit
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Dataset(SeasonDataset),
    /// The first page had no media: nothing airs in this unit
    NoEntries(Quota),
}

/// Paginating fetcher over a `PageSource`
pub struct Fetcher<S> {
    source: S,
    rate_limit_floor: u32,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            rate_limit_floor: DEFAULT_RATE_LIMIT_FLOOR,
        }
    }

    pub fn with_rate_limit_floor(mut self, floor: u32) -> Self {
        self.rate_limit_floor = floor;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every page of one unit
    pub async fn fetch_season(&self, year: i32, season: Season) -> FetchOutcome {
        let mut media: Vec<Value> = Vec::new();
        let mut quota = Quota::default();
        let mut pages = 0;
        let mut current_page = 1;

        let stop = loop {
            let request = PageRequest {
                page: current_page,
                per_page: PAGE_SIZE,
                season_year: year,
                season,
            };

            let reply = match self.source.fetch_page(&request).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(
                        year,
                        season = %season,
                        page = current_page,
                        error = %e,
                        "Failed to retrieve page, keeping pages fetched so far"
                    );
                    break FetchStop::Failed(e.to_string());
                }
            };

            quota = reply.quota;

            if reply.is_throttled() {
                warn!(
                    year,
                    season = %season,
                    page = current_page,
                    quota = %quota,
                    "Rate limited by server, stopping pagination"
                );
                break FetchStop::RateLimited;
            }

            let Some(page) = reply.page else {
                break FetchStop::Failed("response carried no page".to_string());
            };

            if page.media.is_empty() {
                if media.is_empty() {
                    info!(year, season = %season, quota = %quota, "No anime entries found");
                    return FetchOutcome::NoEntries(quota);
                }
                break FetchStop::Exhausted;
            }

            debug!(
                year,
                season = %season,
                page = current_page,
                entries = page.media.len(),
                quota = %quota,
                "Page retrieved"
            );

            pages += 1;
            media.extend(page.media);

            if quota.is_below(self.rate_limit_floor) {
                warn!(
                    year,
                    season = %season,
                    page = current_page,
                    quota = %quota,
                    floor = self.rate_limit_floor,
                    "Rate limit floor reached, stopping pagination"
                );
                break FetchStop::RateLimited;
            }

            if !page.page_info.has_next_page {
                break FetchStop::Exhausted;
            }

            current_page += 1;
        };

        info!(
            year,
            season = %season,
            pages,
            entries = media.len(),
            quota = %quota,
            "Retrieved anime entries"
        );

        FetchOutcome::Dataset(SeasonDataset {
            year,
            season,
            media,
            pages,
            stop,
            quota,
        })
    }
}

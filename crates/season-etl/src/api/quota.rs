//! Rate-limit quota reported by AniList response headers.

use reqwest::header::HeaderMap;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const LIMIT_HEADER: &str = "x-ratelimit-limit";

/// Requests left in the current window, as reported by the server
///
/// Either value is `None` when the header was missing or not an integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quota {
    pub remaining: Option<u32>,
    pub limit: Option<u32>,
}

impl Quota {
    pub fn new(remaining: u32, limit: u32) -> Self {
        Self {
            remaining: Some(remaining),
            limit: Some(limit),
        }
    }

    /// Read `X-RateLimit-Remaining` / `X-RateLimit-Limit`
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            remaining: header_u32(headers, REMAINING_HEADER),
            limit: header_u32(headers, LIMIT_HEADER),
        }
    }

    /// True when the server reported fewer remaining requests than `floor`
    pub fn is_below(&self, floor: u32) -> bool {
        self.remaining.is_some_and(|remaining| remaining < floor)
    }
}

impl std::fmt::Display for Quota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) => write!(f, "{}/{}", remaining, limit),
            (Some(remaining), None) => write!(f, "{}/?", remaining),
            _ => f.write_str("unknown"),
        }
    }
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

//! AniList GraphQL client.
//!
//! The fetcher talks to a `PageSource`; `AniListClient` is the HTTP
//! implementation used by the binary.

pub mod client;
pub mod quota;
pub mod types;

pub use client::{AniListClient, PageSource};
pub use quota::Quota;
pub use types::*;

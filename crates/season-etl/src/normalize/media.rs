//! One-row-per-anime projections: `Anime` and `WebAsset`.

use super::{project, FuzzyDate, MediaContext, Projection};
use crate::fetcher::SeasonDataset;
use serde::Deserialize;
use shared::{AnimeRow, WebAssetRow};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnimeSource {
    title: Option<Title>,
    format: Option<String>,
    mean_score: Option<i64>,
    popularity: Option<i64>,
    episodes: Option<i64>,
    favourites: Option<i64>,
    duration: Option<i64>,
    start_date: Option<FuzzyDate>,
    end_date: Option<FuzzyDate>,
}

#[derive(Deserialize, Default)]
struct Title {
    english: Option<String>,
    native: Option<String>,
    romaji: Option<String>,
}

/// `Anime` projection: titles unnested, fuzzy dates rebuilt as calendar dates
pub fn anime(dataset: &SeasonDataset) -> Projection<AnimeRow> {
    project(dataset, "anime", "title", |ctx: &MediaContext, source: AnimeSource| {
        let title = source.title.unwrap_or_default();
        Ok(vec![AnimeRow {
            anime_id: ctx.anime_id,
            season: ctx.season,
            season_year: ctx.season_year,
            english_title: title.english,
            native_title: title.native,
            romaji_title: title.romaji,
            format: source.format,
            mean_score: source.mean_score,
            popularity: source.popularity,
            episodes: source.episodes,
            favourites: source.favourites,
            duration: source.duration,
            start_date: source.start_date.and_then(FuzzyDate::to_date),
            end_date: source.end_date.and_then(FuzzyDate::to_date),
        }])
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebAssetSource {
    banner_image: Option<String>,
    cover_image: Option<CoverImage>,
    site_url: Option<String>,
    trailer: Option<Trailer>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CoverImage {
    medium: Option<String>,
    large: Option<String>,
    extra_large: Option<String>,
    color: Option<String>,
}

#[derive(Deserialize)]
struct Trailer {
    id: Option<String>,
    site: Option<String>,
}

impl Trailer {
    /// Watch URL for the sites AniList links to, `site:id` otherwise
    fn reference(&self) -> Option<String> {
        let id = self.id.as_deref()?;
        let site = self.site.as_deref().unwrap_or_default();
        Some(match site.to_ascii_lowercase().as_str() {
            "youtube" => format!("https://www.youtube.com/watch?v={}", id),
            "dailymotion" => format!("https://www.dailymotion.com/video/{}", id),
            "" => id.to_string(),
            _ => format!("{}:{}", site, id),
        })
    }
}

/// `WebAsset` projection: banner, covers, colour, site URL, trailer
pub fn web_assets(dataset: &SeasonDataset) -> Projection<WebAssetRow> {
    project(
        dataset,
        "web_assets",
        "coverImage",
        |ctx: &MediaContext, source: WebAssetSource| {
            let cover = source.cover_image.unwrap_or_default();
            Ok(vec![WebAssetRow {
                anime_id: ctx.anime_id,
                season: ctx.season,
                season_year: ctx.season_year,
                banner: source.banner_image,
                medium_cover: cover.medium,
                large_cover: cover.large,
                extra_large_cover: cover.extra_large,
                color: cover.color,
                site_url: source.site_url,
                trailer: source.trailer.as_ref().and_then(Trailer::reference),
            }])
        },
    )
}

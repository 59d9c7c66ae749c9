//! Editorial spotlight picks: the top upcoming premiere and a trailer of
//! the day.
//!
//! Both picks are expensive to compute (several catalog calls) and change
//! slowly, so they are cached with generous TTLs. Selection itself is pure
//! and unit-tested; the service wires it to `CatalogApi` and the cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::TtlCache;
use crate::tmdb::{
    CatalogApi, MovieDetails, MovieSummary, ReleaseDateResults, TmdbError, Video,
};

pub const TOP_PREMIERE_TTL: Duration = Duration::from_secs(12 * 60 * 60);
pub const DAILY_TRAILER_TTL: Duration = Duration::from_secs(6 * 60 * 60);

const CACHE_KEY_TOP_PREMIERE: &str = "spotlight.top_premiere";
const CACHE_KEY_DAILY_TRAILER: &str = "spotlight.trailer_of_the_day";

/// How far ahead the premiere window looks.
const PREMIERE_WINDOW_DAYS: u64 = 14;
/// How many candidates to probe for videos before giving up.
const TRAILER_PROBE_LIMIT: usize = 8;

/// Theatrical-ish release types in preference order: premiere, theatrical,
/// theatrical (limited).
const RELEASE_TYPE_PRIORITY: [u8; 3] = [1, 3, 2];

#[derive(Debug, Error)]
pub enum SpotlightError {
    /// Every candidate source came back empty or failed.
    #[error("no suitable movie available")]
    NothingToShow,

    #[error(transparent)]
    Api(#[from] TmdbError),
}

/// The featured upcoming premiere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPremiere {
    pub details: MovieDetails,
    pub trailer: Option<Video>,
    /// Best regional theatrical date, when one could be determined.
    pub release_date: Option<NaiveDate>,
}

/// Today's featured trailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrailer {
    pub movie: MovieSummary,
    pub video: Video,
}

pub struct SpotlightService {
    catalog: Arc<dyn CatalogApi>,
    cache: TtlCache,
    region: String,
}

impl SpotlightService {
    pub fn new(catalog: Arc<dyn CatalogApi>, cache: TtlCache, region: Option<String>) -> Self {
        Self {
            catalog,
            cache,
            region: region.unwrap_or_else(|| "US".to_string()),
        }
    }

    /// The most popular premiere in the next two weeks, with its best
    /// trailer and regional release date. Falls back to now-playing, then
    /// upcoming, when the premiere window is empty. Cached for 12 hours.
    pub async fn top_premiere(&self) -> Result<TopPremiere, SpotlightError> {
        if let Some(hit) = self
            .cache
            .get::<TopPremiere>(CACHE_KEY_TOP_PREMIERE, TOP_PREMIERE_TTL)
        {
            debug!("Top premiere served from cache");
            return Ok(hit);
        }

        let candidate = self.premiere_candidate().await?;
        let details = self.catalog.premiere_details(candidate.id).await?;

        let trailer = details
            .videos
            .as_ref()
            .and_then(|v| pick_best_trailer(&v.results))
            .cloned();
        let release_date = details
            .release_dates
            .as_ref()
            .and_then(|r| regional_release_date(r, &self.region, Utc::now().date_naive()));

        let premiere = TopPremiere {
            details,
            trailer,
            release_date,
        };
        self.cache.put(CACHE_KEY_TOP_PREMIERE, &premiere);
        Ok(premiere)
    }

    /// A trailer worth featuring today: probes trending movies first, then
    /// now-playing, then popular, taking the first candidate with a usable
    /// YouTube video. Cached for 6 hours.
    pub async fn trailer_of_the_day(&self) -> Result<DailyTrailer, SpotlightError> {
        if let Some(hit) = self
            .cache
            .get::<DailyTrailer>(CACHE_KEY_DAILY_TRAILER, DAILY_TRAILER_TTL)
        {
            debug!("Trailer of the day served from cache");
            return Ok(hit);
        }

        let sources = ["trending", "now_playing", "popular"];
        for source in sources {
            let page = match source {
                "trending" => self.catalog.trending_day(1).await,
                "now_playing" => self.catalog.now_playing(1).await,
                _ => self.catalog.popular(1).await,
            };
            let movies = match page {
                Ok(page) => page.results,
                Err(e) => {
                    warn!("Trailer source {} failed: {}", source, e);
                    continue;
                }
            };

            for movie in movies.into_iter().take(TRAILER_PROBE_LIMIT) {
                let videos = match self.catalog.movie_videos(movie.id).await {
                    Ok(videos) => videos,
                    Err(e) => {
                        warn!("Video lookup failed for movie {}: {}", movie.id, e);
                        continue;
                    }
                };
                if let Some(video) = pick_best_trailer(&videos) {
                    let pick = DailyTrailer {
                        video: video.clone(),
                        movie,
                    };
                    self.cache.put(CACHE_KEY_DAILY_TRAILER, &pick);
                    return Ok(pick);
                }
            }
        }
        Err(SpotlightError::NothingToShow)
    }

    /// Drop both cached picks (e.g. after a region change).
    pub fn invalidate(&self) {
        self.cache.invalidate(CACHE_KEY_TOP_PREMIERE);
        self.cache.invalidate(CACHE_KEY_DAILY_TRAILER);
    }

    async fn premiere_candidate(&self) -> Result<MovieSummary, SpotlightError> {
        let today = Utc::now().date_naive();
        let window_end = today
            .checked_add_days(Days::new(PREMIERE_WINDOW_DAYS))
            .unwrap_or(today);

        match self.catalog.premiere_window(today, window_end).await {
            Ok(page) => {
                if let Some(movie) = most_popular(&page.results) {
                    return Ok(movie.clone());
                }
            }
            Err(e) => warn!("Premiere window lookup failed: {}", e),
        }
        match self.catalog.now_playing(1).await {
            Ok(page) => {
                if let Some(movie) = most_popular(&page.results) {
                    return Ok(movie.clone());
                }
            }
            Err(e) => warn!("Now-playing fallback failed: {}", e),
        }
        match self.catalog.upcoming(1).await {
            Ok(page) => {
                if let Some(movie) = most_popular(&page.results) {
                    return Ok(movie.clone());
                }
            }
            Err(e) => warn!("Upcoming fallback failed: {}", e),
        }
        Err(SpotlightError::NothingToShow)
    }
}

/// Highest-popularity entry; missing popularity counts as zero.
fn most_popular(movies: &[MovieSummary]) -> Option<&MovieSummary> {
    movies
        .iter()
        .max_by(|a, b| {
            a.popularity
                .unwrap_or(0.0)
                .total_cmp(&b.popularity.unwrap_or(0.0))
        })
}

/// The best video to feature, YouTube only: official trailer, any trailer,
/// official teaser, any teaser, then anything at all.
pub fn pick_best_trailer(videos: &[Video]) -> Option<&Video> {
    let youtube: Vec<&Video> = videos.iter().filter(|v| v.is_youtube()).collect();
    youtube
        .iter()
        .find(|v| v.is_trailer() && v.official)
        .or_else(|| youtube.iter().find(|v| v.is_trailer()))
        .or_else(|| youtube.iter().find(|v| v.is_teaser() && v.official))
        .or_else(|| youtube.iter().find(|v| v.is_teaser()))
        .or_else(|| youtube.first())
        .copied()
}

/// The date a movie hits theaters in `region`, falling back to US, then to
/// whatever region is listed first. Within a region, release types are
/// considered in priority order, and among the chosen type's dates the
/// nearest future date wins, else the latest past one.
pub fn regional_release_date(
    results: &ReleaseDateResults,
    region: &str,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let regional = results
        .results
        .iter()
        .find(|r| r.iso_3166_1 == region)
        .or_else(|| results.results.iter().find(|r| r.iso_3166_1 == "US"))
        .or_else(|| results.results.first())?;

    for kind in RELEASE_TYPE_PRIORITY {
        let dates: Vec<NaiveDate> = regional
            .release_dates
            .iter()
            .filter(|e| e.kind == kind)
            .filter_map(|e| parse_release_date(e.release_date.as_deref()?))
            .collect();
        if let Some(date) = choose_date(&dates, today) {
            return Some(date);
        }
    }

    // No theatrical-type entry: take anything parseable.
    let dates: Vec<NaiveDate> = regional
        .release_dates
        .iter()
        .filter_map(|e| parse_release_date(e.release_date.as_deref()?))
        .collect();
    choose_date(&dates, today)
}

/// Release dates come back as ISO timestamps; only the date part matters.
fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn choose_date(dates: &[NaiveDate], today: NaiveDate) -> Option<NaiveDate> {
    dates
        .iter()
        .filter(|d| **d >= today)
        .min()
        .or_else(|| dates.iter().max())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmdb::{RegionalReleaseDates, ReleaseDateEntry};

    fn video(kind: &str, site: &str, official: bool, key: &str) -> Video {
        Video {
            id: key.to_string(),
            key: key.to_string(),
            name: format!("{} {}", kind, key),
            site: site.to_string(),
            kind: kind.to_string(),
            official,
            published_at: None,
        }
    }

    #[test]
    fn test_pick_prefers_official_trailer() {
        let videos = vec![
            video("Teaser", "YouTube", true, "teaser"),
            video("Trailer", "YouTube", false, "fan-cut"),
            video("Trailer", "YouTube", true, "official"),
        ];
        assert_eq!(pick_best_trailer(&videos).unwrap().key, "official");
    }

    #[test]
    fn test_pick_falls_back_through_teasers() {
        let videos = vec![
            video("Clip", "YouTube", true, "clip"),
            video("Teaser", "YouTube", false, "teaser"),
        ];
        assert_eq!(pick_best_trailer(&videos).unwrap().key, "teaser");

        let only_clip = vec![video("Clip", "YouTube", true, "clip")];
        assert_eq!(pick_best_trailer(&only_clip).unwrap().key, "clip");
    }

    #[test]
    fn test_pick_ignores_non_youtube() {
        let videos = vec![
            video("Trailer", "Vimeo", true, "vimeo"),
            video("Teaser", "YouTube", false, "yt"),
        ];
        assert_eq!(pick_best_trailer(&videos).unwrap().key, "yt");

        let vimeo_only = vec![video("Trailer", "Vimeo", true, "vimeo")];
        assert!(pick_best_trailer(&vimeo_only).is_none());
    }

    fn entry(kind: u8, date: &str) -> ReleaseDateEntry {
        ReleaseDateEntry {
            release_date: Some(format!("{}T00:00:00.000Z", date)),
            kind,
        }
    }

    fn release_dates(regions: Vec<(&str, Vec<ReleaseDateEntry>)>) -> ReleaseDateResults {
        ReleaseDateResults {
            results: regions
                .into_iter()
                .map(|(iso, release_dates)| RegionalReleaseDates {
                    iso_3166_1: iso.to_string(),
                    release_dates,
                })
                .collect(),
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_release_date_prefers_requested_region() {
        let results = release_dates(vec![
            ("US", vec![entry(3, "2026-09-01")]),
            ("FR", vec![entry(3, "2026-09-15")]),
        ]);
        assert_eq!(
            regional_release_date(&results, "FR", d("2026-08-01")),
            Some(d("2026-09-15"))
        );
    }

    #[test]
    fn test_release_date_falls_back_to_us_then_first() {
        let results = release_dates(vec![
            ("DE", vec![entry(3, "2026-09-20")]),
            ("US", vec![entry(3, "2026-09-01")]),
        ]);
        assert_eq!(
            regional_release_date(&results, "JP", d("2026-08-01")),
            Some(d("2026-09-01"))
        );

        let no_us = release_dates(vec![("DE", vec![entry(3, "2026-09-20")])]);
        assert_eq!(
            regional_release_date(&no_us, "JP", d("2026-08-01")),
            Some(d("2026-09-20"))
        );
    }

    #[test]
    fn test_release_date_type_priority() {
        // Premiere (1) beats theatrical (3) beats limited (2).
        let results = release_dates(vec![(
            "US",
            vec![
                entry(2, "2026-08-20"),
                entry(3, "2026-09-01"),
                entry(1, "2026-08-25"),
            ],
        )]);
        assert_eq!(
            regional_release_date(&results, "US", d("2026-08-01")),
            Some(d("2026-08-25"))
        );
    }

    #[test]
    fn test_release_date_nearest_future_else_latest_past() {
        let results = release_dates(vec![(
            "US",
            vec![entry(3, "2026-09-10"), entry(3, "2026-08-28")],
        )]);
        assert_eq!(
            regional_release_date(&results, "US", d("2026-08-23")),
            Some(d("2026-08-28"))
        );
        // Everything already released: latest past date.
        assert_eq!(
            regional_release_date(&results, "US", d("2027-01-01")),
            Some(d("2026-09-10"))
        );
    }

    #[test]
    fn test_release_date_non_theatrical_fallback() {
        let results = release_dates(vec![("US", vec![entry(4, "2026-10-01")])]);
        assert_eq!(
            regional_release_date(&results, "US", d("2026-08-01")),
            Some(d("2026-10-01"))
        );
    }

    #[test]
    fn test_release_date_empty() {
        let results = ReleaseDateResults { results: vec![] };
        assert_eq!(regional_release_date(&results, "US", d("2026-08-01")), None);
    }

    #[test]
    fn test_most_popular_handles_missing_popularity() {
        let mut a = crate::testing::fixtures::movie(1, "A");
        a.popularity = None;
        let mut b = crate::testing::fixtures::movie(2, "B");
        b.popularity = Some(3.0);
        assert_eq!(most_popular(&[a, b]).unwrap().id, 2);
        assert!(most_popular(&[]).is_none());
    }
}

//! Types for TMDb API responses.
//!
//! Result records are treated as passthrough data: the engine filters,
//! sorts and accumulates them but never rewrites their fields.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One page of movie results plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoviePage {
    pub results: Vec<MovieSummary>,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl MoviePage {
    /// An empty first page, used when resetting state.
    pub fn empty() -> Self {
        Self {
            results: vec![],
            page: 1,
            total_pages: 1,
            total_count: 0,
        }
    }
}

/// A movie as returned by the list endpoints (search/discover/trending).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    /// Release date as YYYY-MM-DD; may be missing or partial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f32>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub adult: bool,
}

impl MovieSummary {
    /// Release year parsed from the leading YYYY of the release date.
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }
}

/// Full movie record from the details endpoint. `videos` and
/// `release_dates` are present only when appended to the response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<VideoList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_dates: Option<ReleaseDateResults>,
}

/// A TMDb genre reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// A video attached to a movie (trailer, teaser, clip...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: String,
    /// Site-specific key (YouTube video id for `site == "YouTube"`).
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl Video {
    pub fn is_youtube(&self) -> bool {
        self.site == "YouTube"
    }

    pub fn is_trailer(&self) -> bool {
        self.kind.eq_ignore_ascii_case("Trailer")
    }

    pub fn is_teaser(&self) -> bool {
        self.kind.eq_ignore_ascii_case("Teaser")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

/// Per-region release dates from `append_to_response=release_dates`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReleaseDateResults {
    #[serde(default)]
    pub results: Vec<RegionalReleaseDates>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionalReleaseDates {
    /// ISO 3166-1 country code.
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseDateEntry>,
}

/// Release types: 1 Premiere, 2 Theatrical (limited), 3 Theatrical,
/// 4 Digital, 5 Physical, 6 TV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseDateEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: u8,
}

/// A cast credit from the credits endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
}

/// A user review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub author_details: AuthorDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AuthorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<String>,
}

/// TMDb account record, persisted locally after login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountDetails {
    pub id: u32,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub include_adult: bool,
}

/// A freshly minted request token awaiting user approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestToken {
    pub request_token: String,
    pub expires_at: String,
}

/// Per-movie account flags (favorite/watchlist membership).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AccountStates {
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub watchlist: bool,
}

/// Poster/backdrop size buckets supported by the TMDb image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W92,
    W154,
    W185,
    W342,
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W92 => "w92",
            ImageSize::W154 => "w154",
            ImageSize::W185 => "w185",
            ImageSize::W342 => "w342",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::Original => "original",
        }
    }
}

/// The fixed movie genre table; TMDb ids are stable.
pub static GENRES: Lazy<Vec<Genre>> = Lazy::new(|| {
    [
        (28, "Action"),
        (12, "Adventure"),
        (16, "Animation"),
        (35, "Comedy"),
        (80, "Crime"),
        (99, "Documentary"),
        (18, "Drama"),
        (10751, "Family"),
        (14, "Fantasy"),
        (36, "History"),
        (27, "Horror"),
        (10402, "Music"),
        (9648, "Mystery"),
        (10749, "Romance"),
        (878, "Science Fiction"),
        (10770, "TV Movie"),
        (53, "Thriller"),
        (10752, "War"),
        (37, "Western"),
    ]
    .iter()
    .map(|(id, name)| Genre {
        id: *id,
        name: (*name).to_string(),
    })
    .collect()
});

/// Look up the display name for a genre id.
pub fn genre_name(id: u32) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|g| g.id == id)
        .map(|g| g.name.as_str())
}

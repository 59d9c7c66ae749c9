//! Normalized search/filter/sort intent, synchronized to URL state.
//!
//! The whole struct is the unit of change: any field edit starts a new
//! query epoch. Encoding round-trips through query-string pairs so the
//! state is shareable and back/forward-navigable; the page number is
//! deliberately never part of it (the accumulated-list model is not
//! page-addressed).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Sort keys accepted by both the discover endpoint and the client-side
/// sorter. The wire form is `field.direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortKey {
    #[default]
    #[serde(rename = "popularity.desc")]
    PopularityDesc,
    #[serde(rename = "popularity.asc")]
    PopularityAsc,
    #[serde(rename = "vote_average.desc")]
    VoteAverageDesc,
    #[serde(rename = "vote_average.asc")]
    VoteAverageAsc,
    #[serde(rename = "release_date.desc")]
    ReleaseDateDesc,
    #[serde(rename = "release_date.asc")]
    ReleaseDateAsc,
    #[serde(rename = "title.asc")]
    TitleAsc,
    #[serde(rename = "title.desc")]
    TitleDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::PopularityDesc => "popularity.desc",
            SortKey::PopularityAsc => "popularity.asc",
            SortKey::VoteAverageDesc => "vote_average.desc",
            SortKey::VoteAverageAsc => "vote_average.asc",
            SortKey::ReleaseDateDesc => "release_date.desc",
            SortKey::ReleaseDateAsc => "release_date.asc",
            SortKey::TitleAsc => "title.asc",
            SortKey::TitleDesc => "title.desc",
        }
    }

    /// Parse a wire-form sort key. Unknown values yield `None`; callers
    /// fall back to the default rather than failing the whole decode.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "popularity.desc" => Some(SortKey::PopularityDesc),
            "popularity.asc" => Some(SortKey::PopularityAsc),
            "vote_average.desc" => Some(SortKey::VoteAverageDesc),
            "vote_average.asc" => Some(SortKey::VoteAverageAsc),
            "release_date.desc" => Some(SortKey::ReleaseDateDesc),
            "release_date.asc" => Some(SortKey::ReleaseDateAsc),
            "title.asc" => Some(SortKey::TitleAsc),
            "title.desc" => Some(SortKey::TitleDesc),
            _ => None,
        }
    }
}

/// The user's current query intent, immutable per cycle.
///
/// An empty `query` means discover mode (filters applied server-side); a
/// non-empty `query` means search mode (filters applied client-side, since
/// the search endpoint ignores them). Both being "active" at once is legal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Free-text search term; empty string selects discover mode.
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub sort_by: SortKey,
    /// Genre ids to require, OR semantics.
    #[serde(default)]
    pub genres: BTreeSet<u32>,
    /// Inclusive release-year lower bound.
    #[serde(default)]
    pub year_from: Option<i32>,
    /// Inclusive release-year upper bound.
    #[serde(default)]
    pub year_to: Option<i32>,
    /// Inclusive vote-average lower bound, within [0, 10].
    #[serde(default)]
    pub rating_min: Option<f32>,
    /// Inclusive vote-average upper bound, within [0, 10].
    #[serde(default)]
    pub rating_max: Option<f32>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort_by: SortKey::default(),
            genres: BTreeSet::new(),
            year_from: None,
            year_to: None,
            rating_min: None,
            rating_max: None,
        }
    }
}

impl QueryParams {
    /// Discover mode with default sort.
    pub fn discover() -> Self {
        Self::default()
    }

    /// Search mode for a text query.
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn is_search_mode(&self) -> bool {
        !self.query.is_empty()
    }

    /// True when any supplementary filter is active (in search mode these
    /// are applied client-side).
    pub fn has_filters(&self) -> bool {
        !self.genres.is_empty()
            || self.year_from.is_some()
            || self.year_to.is_some()
            || self.rating_min.is_some()
            || self.rating_max.is_some()
    }

    /// URL-state pairs. `sortBy` is always present; empty fields are
    /// omitted so stale keys disappear from the URL.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.query.is_empty() {
            pairs.push(("query".to_string(), self.query.clone()));
        }
        pairs.push(("sortBy".to_string(), self.sort_by.as_str().to_string()));
        if !self.genres.is_empty() {
            let joined = self
                .genres
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("genres".to_string(), joined));
        }
        if let Some(y) = self.year_from {
            pairs.push(("yearFrom".to_string(), y.to_string()));
        }
        if let Some(y) = self.year_to {
            pairs.push(("yearTo".to_string(), y.to_string()));
        }
        if let Some(r) = self.rating_min {
            pairs.push(("ratingMin".to_string(), r.to_string()));
        }
        if let Some(r) = self.rating_max {
            pairs.push(("ratingMax".to_string(), r.to_string()));
        }
        pairs
    }

    /// Percent-encoded query string, e.g.
    /// `query=dune&sortBy=popularity.desc&genres=28,878`.
    pub fn to_query_string(&self) -> String {
        self.to_query_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Decode from raw query-string pairs. Malformed numeric values are
    /// dropped (input-layer coercion), unknown sort keys fall back to the
    /// default, and rating bounds are clamped to [0, 10].
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key {
                "query" => params.query = value.to_string(),
                "sortBy" => {
                    if let Some(sort) = SortKey::parse(value) {
                        params.sort_by = sort;
                    }
                }
                "genres" => {
                    params.genres = value
                        .split(',')
                        .filter_map(|id| id.trim().parse().ok())
                        .collect();
                }
                "yearFrom" => params.year_from = value.parse().ok(),
                "yearTo" => params.year_to = value.parse().ok(),
                "ratingMin" => {
                    params.rating_min = value.parse().ok().map(|r: f32| r.clamp(0.0, 10.0))
                }
                "ratingMax" => {
                    params.rating_max = value.parse().ok().map(|r: f32| r.clamp(0.0, 10.0))
                }
                _ => {}
            }
        }
        params
    }

    /// Decode from a percent-encoded query string.
    pub fn from_query_string(raw: &str) -> Self {
        let decoded: Vec<(String, String)> = raw
            .trim_start_matches('?')
            .split('&')
            .filter(|part| !part.is_empty())
            .filter_map(|part| {
                let (k, v) = part.split_once('=')?;
                let v = urlencoding::decode(v).ok()?;
                Some((k.to_string(), v.into_owned()))
            })
            .collect();
        Self::from_query_pairs(decoded.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

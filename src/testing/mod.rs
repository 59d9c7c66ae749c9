//! Testing utilities and mock implementations for integration tests.
//!
//! This module provides mock implementations of the TMDb-facing traits,
//! allowing the pipeline, auth flow, favorites and spotlight to be tested
//! without real network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use movierate::testing::{fixtures, MockMovieSource};
//!
//! let source = MockMovieSource::new();
//! source.enqueue(Ok(fixtures::page(vec![fixtures::movie(1, "Dune")], 1, 1, 1)));
//! // Use in BrowsePipeline...
//! ```

mod mock_account_api;
mod mock_catalog_api;
mod mock_movie_source;

pub use mock_account_api::MockAccountApi;
pub use mock_catalog_api::MockCatalogApi;
pub use mock_movie_source::{MockMovieSource, RecordedQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::tmdb::{AccountDetails, MovieDetails, MoviePage, MovieSummary, Video};

    /// Create a test movie summary with reasonable defaults.
    pub fn movie(id: u32, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            overview: Some(format!("A movie about {}.", title.to_lowercase())),
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: None,
            release_date: Some("2020-06-15".to_string()),
            vote_average: Some(7.0),
            vote_count: Some(100),
            popularity: Some(id as f32),
            genre_ids: vec![],
            adult: false,
        }
    }

    /// Create a one-off page wrapping the given movies.
    pub fn page(results: Vec<MovieSummary>, page: u32, total_pages: u32, total_count: u64) -> MoviePage {
        MoviePage {
            results,
            page,
            total_pages,
            total_count,
        }
    }

    /// Create test movie details.
    pub fn details(id: u32, title: &str) -> MovieDetails {
        MovieDetails {
            id,
            title: title.to_string(),
            original_title: None,
            overview: Some(format!("A movie about {}.", title.to_lowercase())),
            tagline: None,
            release_date: Some("2020-06-15".to_string()),
            runtime: Some(120),
            status: Some("Released".to_string()),
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: None,
            vote_average: Some(7.0),
            vote_count: Some(100),
            popularity: Some(10.0),
            genres: vec![],
            adult: false,
            imdb_id: None,
            videos: None,
            release_dates: None,
        }
    }

    /// Create a test YouTube video.
    pub fn youtube_video(key: &str, kind: &str, official: bool) -> Video {
        Video {
            id: key.to_string(),
            key: key.to_string(),
            name: format!("{} ({})", key, kind),
            site: "YouTube".to_string(),
            kind: kind.to_string(),
            official,
            published_at: None,
        }
    }

    /// Create a test account record.
    pub fn account(id: u32, username: &str) -> AccountDetails {
        AccountDetails {
            id,
            username: username.to_string(),
            name: None,
            include_adult: false,
        }
    }
}

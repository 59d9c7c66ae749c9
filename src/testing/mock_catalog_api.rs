//! Mock catalog API for testing the spotlight picks.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::tmdb::{CatalogApi, MovieDetails, MoviePage, MovieSummary, TmdbError, Video};

/// Mock implementation of the `CatalogApi` trait.
///
/// Each listing endpoint serves a configurable movie list; videos and
/// details are keyed by movie id. `fail_endpoint` makes one endpoint fail
/// persistently so fallback chains can be exercised.
#[derive(Default)]
pub struct MockCatalogApi {
    trending: Mutex<Vec<MovieSummary>>,
    now_playing: Mutex<Vec<MovieSummary>>,
    upcoming: Mutex<Vec<MovieSummary>>,
    popular: Mutex<Vec<MovieSummary>>,
    premieres: Mutex<Vec<MovieSummary>>,
    videos: Mutex<HashMap<u32, Vec<Video>>>,
    details: Mutex<HashMap<u32, MovieDetails>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MockCatalogApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_trending(&self, movies: Vec<MovieSummary>) {
        *self.trending.lock().unwrap() = movies;
    }

    pub fn set_now_playing(&self, movies: Vec<MovieSummary>) {
        *self.now_playing.lock().unwrap() = movies;
    }

    pub fn set_upcoming(&self, movies: Vec<MovieSummary>) {
        *self.upcoming.lock().unwrap() = movies;
    }

    pub fn set_popular(&self, movies: Vec<MovieSummary>) {
        *self.popular.lock().unwrap() = movies;
    }

    pub fn set_premieres(&self, movies: Vec<MovieSummary>) {
        *self.premieres.lock().unwrap() = movies;
    }

    pub fn set_videos(&self, movie_id: u32, videos: Vec<Video>) {
        self.videos.lock().unwrap().insert(movie_id, videos);
    }

    pub fn set_details(&self, details: MovieDetails) {
        self.details.lock().unwrap().insert(details.id, details);
    }

    /// Make an endpoint fail persistently. Valid names: "trending",
    /// "now_playing", "upcoming", "popular", "premiere_window",
    /// "movie_videos", "premiere_details".
    pub fn fail_endpoint(&self, name: &'static str) {
        self.failing.lock().unwrap().insert(name);
    }

    fn check(&self, name: &str) -> Result<(), TmdbError> {
        if self.failing.lock().unwrap().contains(name) {
            return Err(TmdbError::ApiError {
                status: 500,
                message: format!("{} unavailable", name),
            });
        }
        Ok(())
    }

    fn page_of(movies: Vec<MovieSummary>, page: u32) -> MoviePage {
        let total = movies.len() as u64;
        MoviePage {
            results: movies,
            page,
            total_pages: 1,
            total_count: total,
        }
    }
}

#[async_trait]
impl CatalogApi for MockCatalogApi {
    async fn trending_day(&self, page: u32) -> Result<MoviePage, TmdbError> {
        self.check("trending")?;
        Ok(Self::page_of(self.trending.lock().unwrap().clone(), page))
    }

    async fn now_playing(&self, page: u32) -> Result<MoviePage, TmdbError> {
        self.check("now_playing")?;
        Ok(Self::page_of(self.now_playing.lock().unwrap().clone(), page))
    }

    async fn upcoming(&self, page: u32) -> Result<MoviePage, TmdbError> {
        self.check("upcoming")?;
        Ok(Self::page_of(self.upcoming.lock().unwrap().clone(), page))
    }

    async fn popular(&self, page: u32) -> Result<MoviePage, TmdbError> {
        self.check("popular")?;
        Ok(Self::page_of(self.popular.lock().unwrap().clone(), page))
    }

    async fn premiere_window(
        &self,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<MoviePage, TmdbError> {
        self.check("premiere_window")?;
        Ok(Self::page_of(self.premieres.lock().unwrap().clone(), 1))
    }

    async fn movie_videos(&self, movie_id: u32) -> Result<Vec<Video>, TmdbError> {
        self.check("movie_videos")?;
        Ok(self
            .videos
            .lock()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn premiere_details(&self, movie_id: u32) -> Result<MovieDetails, TmdbError> {
        self.check("premiere_details")?;
        self.details
            .lock()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| TmdbError::NotFound(format!("movie {}", movie_id)))
    }
}

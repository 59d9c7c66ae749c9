//! TMDb API integration.
//!
//! `TmdbClient` is the only component that talks to the network. The rest
//! of the engine reaches it through three narrow traits so tests can swap
//! in mocks: `MovieSource` (the query pipeline), `CatalogApi` (spotlight
//! browsing) and `AccountApi` (auth sessions and favorites).

mod client;
mod types;

pub use client::{authorize_url, TmdbClient, TmdbConfig, MIN_VOTE_COUNT};
pub use types::*;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::query::QueryParams;

/// Errors that can occur when talking to TMDb.
#[derive(Debug, Error)]
pub enum TmdbError {
    /// HTTP request failed (transport-level).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing or invalid API key).
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// Request was superseded and cancelled before completion. Never
    /// surfaced to the user.
    #[error("Request cancelled")]
    Cancelled,
}

impl TmdbError {
    /// True for the supersession variant that callers swallow silently.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TmdbError::Cancelled)
    }
}

/// The query pipeline's view of the catalog: one page at a time, either by
/// free text (search mode) or by structured filters (discover mode).
///
/// Implementations must honor the cancellation token and fail fast with
/// `TmdbError::Cancelled` rather than returning stale data.
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// Free-text title search. Filters in `params` are NOT applied
    /// server-side; the caller post-filters.
    async fn search(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<MoviePage, TmdbError>;

    /// Structured discovery query with server-side filtering.
    async fn discover(
        &self,
        params: &QueryParams,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<MoviePage, TmdbError>;
}

/// Browse and detail endpoints used outside the query pipeline.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Movies trending today.
    async fn trending_day(&self, page: u32) -> Result<MoviePage, TmdbError>;

    /// Currently in theaters for the configured region.
    async fn now_playing(&self, page: u32) -> Result<MoviePage, TmdbError>;

    /// Upcoming releases for the configured region.
    async fn upcoming(&self, page: u32) -> Result<MoviePage, TmdbError>;

    /// Most popular movies.
    async fn popular(&self, page: u32) -> Result<MoviePage, TmdbError>;

    /// Theatrical premieres inside an inclusive regional release window.
    async fn premiere_window(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<MoviePage, TmdbError>;

    /// Videos attached to a movie.
    async fn movie_videos(&self, movie_id: u32) -> Result<Vec<Video>, TmdbError>;

    /// Movie details with videos and regional release dates appended.
    async fn premiere_details(&self, movie_id: u32) -> Result<MovieDetails, TmdbError>;
}

/// Session-scoped operations: the token/session handshake and per-account
/// favorites.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn create_request_token(&self) -> Result<RequestToken, TmdbError>;

    /// Exchange an approved request token for a session id.
    async fn create_session(&self, request_token: &str) -> Result<String, TmdbError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), TmdbError>;

    async fn account_details(&self, session_id: &str) -> Result<AccountDetails, TmdbError>;

    /// Favorite movies for an account, newest first.
    async fn favorite_movies(
        &self,
        account_id: u32,
        session_id: &str,
        page: u32,
    ) -> Result<MoviePage, TmdbError>;

    /// Mark or unmark a movie as favorite.
    async fn set_favorite(
        &self,
        account_id: u32,
        session_id: &str,
        movie_id: u32,
        favorite: bool,
    ) -> Result<(), TmdbError>;

    /// Per-movie account flags.
    async fn account_states(
        &self,
        movie_id: u32,
        session_id: &str,
    ) -> Result<AccountStates, TmdbError>;
}

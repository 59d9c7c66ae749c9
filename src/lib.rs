//! Headless movie discovery and rating engine backed by TMDb.
//!
//! The heart of the crate is [`pipeline::BrowsePipeline`]: it turns filter
//! and search edits into debounced, superseding TMDb queries and
//! accumulates the resulting pages into one consistent snapshot. Around it
//! sit session management ([`auth`]), per-account favorites
//! ([`favorites`]), local star ratings ([`ratings`]) and the cached
//! editorial picks ([`spotlight`]).

pub mod auth;
pub mod config;
pub mod favorites;
pub mod pipeline;
pub mod query;
pub mod ratings;
pub mod spotlight;
pub mod store;
pub mod testing;
pub mod tmdb;

pub use auth::{AuthError, AuthFlow, AuthState};
pub use config::{load_config, load_config_from_str, Config, ConfigError, SanitizedConfig};
pub use pipeline::{BrowsePipeline, BrowseSnapshot, FILTER_QUIET_PERIOD};
pub use query::{MergeMode, PageAccumulator, QueryParams, SortKey};
pub use tmdb::{TmdbClient, TmdbConfig, TmdbError};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::tmdb::TmdbConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Local persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path of the JSON store holding sessions, ratings and caches.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("movierate.json")
}

/// Sanitized config for display/diagnostics (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub tmdb: SanitizedTmdbConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    pub api_key: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Config {
    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            tmdb: SanitizedTmdbConfig {
                api_key: "***",
                base_url: self.tmdb.base_url.clone(),
                language: self.tmdb.language.clone(),
                region: self.tmdb.region.clone(),
            },
            storage: self.storage.clone(),
        }
    }
}

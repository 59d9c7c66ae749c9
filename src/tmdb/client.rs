//! TMDb (The Movie Database) API client.
//!
//! One `reqwest` client behind the three service traits. Rate limits are
//! generous (around 40 requests per second) so no local throttling is
//! applied; a 429 still maps to its own error variant.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::{
    AccountDetails, AccountStates, CastMember, ImageSize, MovieDetails, MoviePage, MovieSummary,
    RequestToken, Review, Video, VideoList,
};
use super::{AccountApi, CatalogApi, MovieSource, TmdbError};
use crate::query::QueryParams;

/// Discover-mode server-side floor on vote counts, excluding statistically
/// insignificant entries.
pub const MIN_VOTE_COUNT: u32 = 10;

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const AUTHENTICATE_URL: &str = "https://www.themoviedb.org/authenticate";

/// TMDb API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDb v3 API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters/backdrops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// Preferred content language (e.g. "en-US").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Region for release windows and theater listings (e.g. "US").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// The URL the user must visit to approve a request token.
pub fn authorize_url(request_token: &str, redirect_to: Option<&str>) -> String {
    match redirect_to {
        Some(redirect) => format!(
            "{}/{}?redirect_to={}",
            AUTHENTICATE_URL,
            request_token,
            urlencoding::encode(redirect)
        ),
        None => format!("{}/{}", AUTHENTICATE_URL, request_token),
    }
}

/// TMDb API client. Cheap to clone is not needed; share via `Arc`.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    image_base_url: String,
    api_key: String,
    language: Option<String>,
    region: Option<String>,
}

impl TmdbClient {
    /// Create a new TMDb client.
    pub fn new(config: TmdbConfig) -> Result<Self, TmdbError> {
        if config.api_key.is_empty() {
            return Err(TmdbError::NotConfigured(
                "TMDb API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            image_base_url: config
                .image_base_url
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
            api_key: config.api_key,
            language: config.language,
            region: config.region,
        })
    }

    /// Build a CDN URL for a poster/backdrop path.
    pub fn image_url(&self, path: &str, size: ImageSize) -> String {
        format!("{}/{}{}", self.image_base_url, size.as_str(), path)
    }

    /// Translate `QueryParams` into discover endpoint query pairs. Only
    /// active filters appear; the vote-count floor is always applied.
    pub fn discover_query(params: &QueryParams, page: u32) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), page.to_string()),
            ("sort_by".to_string(), params.sort_by.as_str().to_string()),
            ("include_adult".to_string(), "false".to_string()),
        ];
        if !params.genres.is_empty() {
            let joined = params
                .genres
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("with_genres".to_string(), joined));
        }
        if let Some(year) = params.year_from {
            pairs.push((
                "primary_release_date.gte".to_string(),
                format!("{}-01-01", year),
            ));
        }
        if let Some(year) = params.year_to {
            pairs.push((
                "primary_release_date.lte".to_string(),
                format!("{}-12-31", year),
            ));
        }
        if let Some(rating) = params.rating_min {
            pairs.push(("vote_average.gte".to_string(), rating.to_string()));
        }
        if let Some(rating) = params.rating_max {
            pairs.push(("vote_average.lte".to_string(), rating.to_string()));
        }
        pairs.push(("vote_count.gte".to_string(), MIN_VOTE_COUNT.to_string()));
        pairs
    }

    fn language_pair(&self) -> Option<(String, String)> {
        self.language
            .as_ref()
            .map(|lang| ("language".to_string(), lang.clone()))
    }

    fn region_pair(&self) -> Option<(String, String)> {
        self.region
            .as_ref()
            .map(|region| ("region".to_string(), region.clone()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, TmdbError> {
        debug!("TMDB GET {} ({} params)", path, query.len());
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;
        Self::parse_body(Self::check_status(response, path).await?, path).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
        body: &B,
    ) -> Result<T, TmdbError> {
        debug!("TMDB POST {}", path);
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .json(body)
            .send()
            .await?;
        Self::parse_body(Self::check_status(response, path).await?, path).await
    }

    async fn delete_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TmdbError> {
        debug!("TMDB DELETE {}", path);
        let response = self
            .client
            .delete(format!("{}{}", self.base_url, path))
            .query(&[("api_key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        Self::parse_body(Self::check_status(response, path).await?, path).await
    }

    async fn check_status(response: Response, what: &str) -> Result<Response, TmdbError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(TmdbError::NotConfigured(
                "Invalid TMDb API key".to_string(),
            ));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound(what.to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TmdbError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TmdbError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }

    async fn parse_body<T: DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> Result<T, TmdbError> {
        response.json().await.map_err(|e| {
            TmdbError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })
    }

    async fn fetch_page(
        &self,
        path: &str,
        mut query: Vec<(String, String)>,
    ) -> Result<MoviePage, TmdbError> {
        if let Some(lang) = self.language_pair() {
            query.push(lang);
        }
        let page: PageResponse = self.get_json(path, &query).await?;
        Ok(page.into())
    }
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn search(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<MoviePage, TmdbError> {
        let pairs = vec![
            ("query".to_string(), query.to_string()),
            ("page".to_string(), page.to_string()),
            ("include_adult".to_string(), "false".to_string()),
        ];
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TmdbError::Cancelled),
            result = self.fetch_page("/search/movie", pairs) => result,
        }
    }

    async fn discover(
        &self,
        params: &QueryParams,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<MoviePage, TmdbError> {
        let pairs = Self::discover_query(params, page);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TmdbError::Cancelled),
            result = self.fetch_page("/discover/movie", pairs) => result,
        }
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn trending_day(&self, page: u32) -> Result<MoviePage, TmdbError> {
        self.fetch_page(
            "/trending/movie/day",
            vec![("page".to_string(), page.to_string())],
        )
        .await
    }

    async fn now_playing(&self, page: u32) -> Result<MoviePage, TmdbError> {
        let mut pairs = vec![("page".to_string(), page.to_string())];
        if let Some(region) = self.region_pair() {
            pairs.push(region);
        }
        self.fetch_page("/movie/now_playing", pairs).await
    }

    async fn upcoming(&self, page: u32) -> Result<MoviePage, TmdbError> {
        let mut pairs = vec![("page".to_string(), page.to_string())];
        if let Some(region) = self.region_pair() {
            pairs.push(region);
        }
        self.fetch_page("/movie/upcoming", pairs).await
    }

    async fn popular(&self, page: u32) -> Result<MoviePage, TmdbError> {
        let mut pairs = vec![("page".to_string(), page.to_string())];
        if let Some(region) = self.region_pair() {
            pairs.push(region);
        }
        self.fetch_page("/movie/popular", pairs).await
    }

    async fn premiere_window(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<MoviePage, TmdbError> {
        let mut pairs = vec![
            ("page".to_string(), "1".to_string()),
            ("sort_by".to_string(), "popularity.desc".to_string()),
            ("include_adult".to_string(), "false".to_string()),
            ("include_video".to_string(), "false".to_string()),
            (
                "release_date.gte".to_string(),
                from.format("%Y-%m-%d").to_string(),
            ),
            (
                "release_date.lte".to_string(),
                to.format("%Y-%m-%d").to_string(),
            ),
            // Premiere and theatrical release types; works together with
            // `region` to filter on the regional release date.
            ("with_release_type".to_string(), "1|2|3".to_string()),
        ];
        if let Some(region) = self.region_pair() {
            pairs.push(region);
        }
        self.fetch_page("/discover/movie", pairs).await
    }

    async fn movie_videos(&self, movie_id: u32) -> Result<Vec<Video>, TmdbError> {
        let mut pairs = vec![];
        if let Some(lang) = self.language_pair() {
            pairs.push(lang);
        }
        let list: VideoList = self
            .get_json(&format!("/movie/{}/videos", movie_id), &pairs)
            .await?;
        Ok(list.results)
    }

    async fn premiere_details(&self, movie_id: u32) -> Result<MovieDetails, TmdbError> {
        let mut pairs = vec![(
            "append_to_response".to_string(),
            "videos,release_dates".to_string(),
        )];
        if let Some(lang) = self.language_pair() {
            pairs.push(lang);
        }
        self.get_json(&format!("/movie/{}", movie_id), &pairs).await
    }
}

impl TmdbClient {
    /// Full details for a movie.
    pub async fn movie_details(&self, movie_id: u32) -> Result<MovieDetails, TmdbError> {
        let mut pairs = vec![];
        if let Some(lang) = self.language_pair() {
            pairs.push(lang);
        }
        self.get_json(&format!("/movie/{}", movie_id), &pairs).await
    }

    /// Cast list for a movie, in billing order.
    pub async fn movie_cast(&self, movie_id: u32) -> Result<Vec<CastMember>, TmdbError> {
        let credits: CreditsResponse = self
            .get_json(&format!("/movie/{}/credits", movie_id), &[])
            .await?;
        Ok(credits.cast)
    }

    /// One page of user reviews for a movie.
    pub async fn movie_reviews(&self, movie_id: u32, page: u32) -> Result<Vec<Review>, TmdbError> {
        let response: ReviewsResponse = self
            .get_json(
                &format!("/movie/{}/reviews", movie_id),
                &[("page".to_string(), page.to_string())],
            )
            .await?;
        Ok(response.results)
    }

    /// YouTube trailers for a movie, in API order.
    pub async fn movie_trailers(&self, movie_id: u32) -> Result<Vec<Video>, TmdbError> {
        let videos = self.movie_videos(movie_id).await?;
        Ok(videos
            .into_iter()
            .filter(|v| v.is_trailer() && v.is_youtube())
            .collect())
    }
}

#[async_trait]
impl AccountApi for TmdbClient {
    async fn create_request_token(&self) -> Result<RequestToken, TmdbError> {
        let response: TokenResponse = self.get_json("/authentication/token/new", &[]).await?;
        if !response.success {
            return Err(TmdbError::ApiError {
                status: 200,
                message: "request token was not granted".to_string(),
            });
        }
        Ok(RequestToken {
            request_token: response.request_token,
            expires_at: response.expires_at,
        })
    }

    async fn create_session(&self, request_token: &str) -> Result<String, TmdbError> {
        let response: SessionResponse = self
            .post_json(
                "/authentication/session/new",
                &[],
                &serde_json::json!({ "request_token": request_token }),
            )
            .await?;
        if !response.success {
            return Err(TmdbError::ApiError {
                status: 200,
                message: "session was not created".to_string(),
            });
        }
        Ok(response.session_id)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), TmdbError> {
        let _: StatusResponse = self
            .delete_json(
                "/authentication/session",
                &serde_json::json!({ "session_id": session_id }),
            )
            .await?;
        Ok(())
    }

    async fn account_details(&self, session_id: &str) -> Result<AccountDetails, TmdbError> {
        self.get_json(
            "/account",
            &[("session_id".to_string(), session_id.to_string())],
        )
        .await
    }

    async fn favorite_movies(
        &self,
        account_id: u32,
        session_id: &str,
        page: u32,
    ) -> Result<MoviePage, TmdbError> {
        self.fetch_page(
            &format!("/account/{}/favorite/movies", account_id),
            vec![
                ("session_id".to_string(), session_id.to_string()),
                ("page".to_string(), page.to_string()),
                ("sort_by".to_string(), "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn set_favorite(
        &self,
        account_id: u32,
        session_id: &str,
        movie_id: u32,
        favorite: bool,
    ) -> Result<(), TmdbError> {
        let response: StatusResponse = self
            .post_json(
                &format!("/account/{}/favorite", account_id),
                &[("session_id".to_string(), session_id.to_string())],
                &serde_json::json!({
                    "media_type": "movie",
                    "media_id": movie_id,
                    "favorite": favorite,
                }),
            )
            .await?;
        if !response.success {
            return Err(TmdbError::ApiError {
                status: 200,
                message: response
                    .status_message
                    .unwrap_or_else(|| "favorite update rejected".to_string()),
            });
        }
        Ok(())
    }

    async fn account_states(
        &self,
        movie_id: u32,
        session_id: &str,
    ) -> Result<AccountStates, TmdbError> {
        self.get_json(
            &format!("/movie/{}/account_states", movie_id),
            &[("session_id".to_string(), session_id.to_string())],
        )
        .await
    }
}

// ============================================================================
// Wire types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default)]
    results: Vec<MovieSummary>,
    #[serde(default = "default_page")]
    total_pages: u32,
    #[serde(default)]
    total_results: u64,
}

fn default_page() -> u32 {
    1
}

impl From<PageResponse> for MoviePage {
    fn from(r: PageResponse) -> Self {
        Self {
            results: r.results,
            page: r.page,
            total_pages: r.total_pages,
            total_count: r.total_results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreditsResponse {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
struct ReviewsResponse {
    #[serde(default)]
    results: Vec<Review>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    success: bool,
    request_token: String,
    #[serde(default)]
    expires_at: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    success: bool,
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    status_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortKey;

    fn client() -> TmdbClient {
        TmdbClient::new(TmdbConfig {
            api_key: "test-key".to_string(),
            base_url: None,
            image_base_url: None,
            language: None,
            region: None,
        })
        .unwrap()
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let result = TmdbClient::new(TmdbConfig {
            api_key: String::new(),
            base_url: None,
            image_base_url: None,
            language: None,
            region: None,
        });
        assert!(matches!(result, Err(TmdbError::NotConfigured(_))));
    }

    #[test]
    fn test_discover_query_with_no_filters_is_minimal() {
        let pairs = TmdbClient::discover_query(&QueryParams::default(), 1);
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["page", "sort_by", "include_adult", "vote_count.gte"]
        );
        assert!(pairs.contains(&("sort_by".to_string(), "popularity.desc".to_string())));
        assert!(pairs.contains(&("vote_count.gte".to_string(), "10".to_string())));
    }

    #[test]
    fn test_discover_query_translates_all_filters() {
        let params = QueryParams {
            query: String::new(),
            sort_by: SortKey::VoteAverageDesc,
            genres: [28].into_iter().collect(),
            year_from: Some(2020),
            year_to: Some(2023),
            rating_min: Some(6.0),
            rating_max: Some(9.5),
        };
        let pairs = TmdbClient::discover_query(&params, 2);
        assert!(pairs.contains(&("with_genres".to_string(), "28".to_string())));
        assert!(pairs.contains(&(
            "primary_release_date.gte".to_string(),
            "2020-01-01".to_string()
        )));
        assert!(pairs.contains(&(
            "primary_release_date.lte".to_string(),
            "2023-12-31".to_string()
        )));
        assert!(pairs.contains(&("sort_by".to_string(), "vote_average.desc".to_string())));
        assert!(pairs.contains(&("vote_average.gte".to_string(), "6".to_string())));
        assert!(pairs.contains(&("vote_average.lte".to_string(), "9.5".to_string())));
        assert!(pairs.contains(&("vote_count.gte".to_string(), "10".to_string())));
        assert!(pairs.contains(&("page".to_string(), "2".to_string())));
    }

    #[test]
    fn test_genre_set_joins_as_or_list() {
        let params = QueryParams {
            genres: [878, 28, 12].into_iter().collect(),
            ..QueryParams::default()
        };
        let pairs = TmdbClient::discover_query(&params, 1);
        // BTreeSet keeps ids ordered.
        assert!(pairs.contains(&("with_genres".to_string(), "12,28,878".to_string())));
    }

    #[test]
    fn test_authorize_url() {
        assert_eq!(
            authorize_url("tok123", None),
            "https://www.themoviedb.org/authenticate/tok123"
        );
        assert_eq!(
            authorize_url("tok123", Some("https://app.example/approved?x=1")),
            "https://www.themoviedb.org/authenticate/tok123?redirect_to=https%3A%2F%2Fapp.example%2Fapproved%3Fx%3D1"
        );
    }

    #[test]
    fn test_image_url() {
        let client = client();
        assert_eq!(
            client.image_url("/poster.jpg", ImageSize::W500),
            "https://image.tmdb.org/t/p/w500/poster.jpg"
        );
    }

    #[test]
    fn test_page_response_conversion() {
        let raw = r#"{
            "page": 2,
            "results": [{"id": 1, "title": "One"}],
            "total_pages": 7,
            "total_results": 130
        }"#;
        let response: PageResponse = serde_json::from_str(raw).unwrap();
        let page: MoviePage = response.into();
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 7);
        assert_eq!(page.total_count, 130);
        assert_eq!(page.results.len(), 1);
    }
}

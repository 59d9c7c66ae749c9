//! Mock account API for testing the auth flow and favorites.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::tmdb::{
    AccountApi, AccountDetails, AccountStates, MoviePage, MovieSummary, RequestToken, TmdbError,
};

/// Mock implementation of the `AccountApi` trait.
///
/// Holds an in-memory favorites list (newest first) and a configurable
/// account. `fail_next` makes the next API call fail with the given error,
/// whichever operation it is.
pub struct MockAccountApi {
    account: Mutex<AccountDetails>,
    favorites: Mutex<Vec<MovieSummary>>,
    deleted_sessions: Mutex<Vec<String>>,
    next_error: Mutex<Option<TmdbError>>,
    token_counter: Mutex<u32>,
}

impl Default for MockAccountApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAccountApi {
    pub fn new() -> Self {
        Self {
            account: Mutex::new(AccountDetails {
                id: 1,
                username: "tester".to_string(),
                name: None,
                include_adult: false,
            }),
            favorites: Mutex::new(Vec::new()),
            deleted_sessions: Mutex::new(Vec::new()),
            next_error: Mutex::new(None),
            token_counter: Mutex::new(0),
        }
    }

    pub fn set_account(&self, account: AccountDetails) {
        *self.account.lock().unwrap() = account;
    }

    pub fn set_favorites(&self, movies: Vec<MovieSummary>) {
        *self.favorites.lock().unwrap() = movies;
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: TmdbError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    /// Session ids passed to `delete_session` so far.
    pub fn deleted_sessions(&self) -> Vec<String> {
        self.deleted_sessions.lock().unwrap().clone()
    }

    pub fn favorite_ids(&self) -> Vec<u32> {
        self.favorites.lock().unwrap().iter().map(|m| m.id).collect()
    }

    fn take_error(&self) -> Option<TmdbError> {
        self.next_error.lock().unwrap().take()
    }
}

#[async_trait]
impl AccountApi for MockAccountApi {
    async fn create_request_token(&self) -> Result<RequestToken, TmdbError> {
        if let Some(e) = self.take_error() {
            return Err(e);
        }
        let mut counter = self.token_counter.lock().unwrap();
        *counter += 1;
        Ok(RequestToken {
            request_token: format!("token-{}", counter),
            expires_at: "2099-01-01 00:00:00 UTC".to_string(),
        })
    }

    async fn create_session(&self, request_token: &str) -> Result<String, TmdbError> {
        if let Some(e) = self.take_error() {
            return Err(e);
        }
        Ok(format!("session-for-{}", request_token))
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), TmdbError> {
        self.deleted_sessions
            .lock()
            .unwrap()
            .push(session_id.to_string());
        if let Some(e) = self.take_error() {
            return Err(e);
        }
        Ok(())
    }

    async fn account_details(&self, _session_id: &str) -> Result<AccountDetails, TmdbError> {
        if let Some(e) = self.take_error() {
            return Err(e);
        }
        Ok(self.account.lock().unwrap().clone())
    }

    async fn favorite_movies(
        &self,
        _account_id: u32,
        _session_id: &str,
        page: u32,
    ) -> Result<MoviePage, TmdbError> {
        if let Some(e) = self.take_error() {
            return Err(e);
        }
        let favorites = self.favorites.lock().unwrap();
        Ok(MoviePage {
            results: favorites.clone(),
            page,
            total_pages: 1,
            total_count: favorites.len() as u64,
        })
    }

    async fn set_favorite(
        &self,
        _account_id: u32,
        _session_id: &str,
        movie_id: u32,
        favorite: bool,
    ) -> Result<(), TmdbError> {
        if let Some(e) = self.take_error() {
            return Err(e);
        }
        let mut favorites = self.favorites.lock().unwrap();
        favorites.retain(|m| m.id != movie_id);
        if favorite {
            // Newest first, like the created_at.desc listing.
            favorites.insert(0, super::fixtures::movie(movie_id, &format!("Movie {}", movie_id)));
        }
        Ok(())
    }

    async fn account_states(
        &self,
        movie_id: u32,
        _session_id: &str,
    ) -> Result<AccountStates, TmdbError> {
        if let Some(e) = self.take_error() {
            return Err(e);
        }
        let favorite = self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.id == movie_id);
        Ok(AccountStates {
            favorite,
            watchlist: false,
        })
    }
}

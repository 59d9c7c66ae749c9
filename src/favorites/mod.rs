//! Per-account favorites, backed by the TMDb account endpoints.
//!
//! The favorite count is broadcast over a `watch` channel so observers
//! (badges, menus) follow it without polling, and persisted so the last
//! known value survives a restart.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::auth::AuthFlow;
use crate::store::KvStore;
use crate::tmdb::{AccountApi, MoviePage, TmdbError};

const KEY_COUNT: &str = "favorites.count";

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] TmdbError),
}

/// Favorites operations for the signed-in account.
pub struct FavoritesService {
    api: Arc<dyn AccountApi>,
    auth: Arc<AuthFlow>,
    store: Arc<dyn KvStore>,
    count_tx: watch::Sender<u64>,
}

impl FavoritesService {
    /// The count channel starts from the persisted value so the badge is
    /// right before the first refresh.
    pub fn new(api: Arc<dyn AccountApi>, auth: Arc<AuthFlow>, store: Arc<dyn KvStore>) -> Self {
        let initial = store
            .get(KEY_COUNT)
            .ok()
            .flatten()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let (count_tx, _) = watch::channel(initial);
        Self {
            api,
            auth,
            store,
            count_tx,
        }
    }

    /// Subscribe to favorite-count changes. The receiver's current value is
    /// the last known count.
    pub fn count_watcher(&self) -> watch::Receiver<u64> {
        self.count_tx.subscribe()
    }

    pub fn count(&self) -> u64 {
        *self.count_tx.borrow()
    }

    /// One page of the account's favorite movies, newest first.
    pub async fn list(&self, page: u32) -> Result<MoviePage, FavoritesError> {
        let (account_id, session_id) = self.credentials().await?;
        let page = self.api.favorite_movies(account_id, &session_id, page).await?;
        self.publish_count(page.total_count);
        Ok(page)
    }

    pub async fn add(&self, movie_id: u32) -> Result<(), FavoritesError> {
        self.set(movie_id, true).await
    }

    pub async fn remove(&self, movie_id: u32) -> Result<(), FavoritesError> {
        self.set(movie_id, false).await
    }

    /// Flip a movie's favorite flag; returns the new state.
    pub async fn toggle(&self, movie_id: u32) -> Result<bool, FavoritesError> {
        let favored = self.is_favorite(movie_id).await;
        self.set(movie_id, !favored).await?;
        Ok(!favored)
    }

    /// Whether a movie is currently favorited. Lookup failures (including
    /// being signed out) read as not-favorited.
    pub async fn is_favorite(&self, movie_id: u32) -> bool {
        let session_id = match self.auth.session() {
            Some(session) => session.session_id,
            None => return false,
        };
        match self.api.account_states(movie_id, &session_id).await {
            Ok(states) => states.favorite,
            Err(e) => {
                warn!("Failed to read account states for movie {}: {}", movie_id, e);
                false
            }
        }
    }

    /// Re-fetch the total and broadcast it.
    pub async fn refresh_count(&self) -> Result<u64, FavoritesError> {
        let (account_id, session_id) = self.credentials().await?;
        let page = self.api.favorite_movies(account_id, &session_id, 1).await?;
        self.publish_count(page.total_count);
        Ok(page.total_count)
    }

    /// Forget the persisted count (on logout) and broadcast zero.
    pub fn reset(&self) {
        if let Err(e) = self.store.remove(KEY_COUNT) {
            warn!("Failed to clear persisted favorite count: {}", e);
        }
        self.count_tx.send_replace(0);
    }

    async fn set(&self, movie_id: u32, favorite: bool) -> Result<(), FavoritesError> {
        let (account_id, session_id) = self.credentials().await?;
        self.api
            .set_favorite(account_id, &session_id, movie_id, favorite)
            .await?;
        debug!("Movie {} favorite={}", movie_id, favorite);
        // Keep the broadcast count in sync with the mutation.
        let page = self.api.favorite_movies(account_id, &session_id, 1).await?;
        self.publish_count(page.total_count);
        Ok(())
    }

    /// Session id plus account id, fetching the account record when the
    /// restored session predates it.
    async fn credentials(&self) -> Result<(u32, String), FavoritesError> {
        let session = self
            .auth
            .session()
            .ok_or(FavoritesError::NotAuthenticated)?;
        match session.account {
            Some(account) => Ok((account.id, session.session_id)),
            None => {
                let account = self.api.account_details(&session.session_id).await?;
                Ok((account.id, session.session_id))
            }
        }
    }

    fn publish_count(&self, count: u64) {
        if let Err(e) = self.store.set(KEY_COUNT, &count.to_string()) {
            warn!("Failed to persist favorite count: {}", e);
        }
        self.count_tx.send_replace(count);
    }
}

//! Locally persisted user ratings (1-10 stars per movie).
//!
//! Ratings never touch the TMDb account; they live as one JSON document in
//! the key-value store, keyed by movie id.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{KvStore, StoreError};

const KEY_RATINGS: &str = "ratings.v1";

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("rating {0} out of range ({MIN_RATING}-{MAX_RATING})")]
    OutOfRange(u8),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("corrupt ratings document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// One stored rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub rating: u8,
    /// Title at the time of rating, kept for display without a lookup.
    pub title: String,
    pub rated_at: DateTime<Utc>,
}

/// Aggregate view over all ratings.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingStats {
    pub total: usize,
    /// Mean rating rounded to one decimal; 0.0 when empty.
    pub average: f64,
    pub highest: Option<(u32, RatingEntry)>,
    pub lowest: Option<(u32, RatingEntry)>,
}

/// Ratings CRUD over a key-value store.
pub struct RatingStore {
    store: Arc<dyn KvStore>,
}

impl RatingStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Rate a movie, replacing any previous rating.
    pub fn set(&self, movie_id: u32, rating: u8, title: &str) -> Result<(), RatingError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(RatingError::OutOfRange(rating));
        }
        let mut ratings = self.load()?;
        ratings.insert(
            movie_id,
            RatingEntry {
                rating,
                title: title.to_string(),
                rated_at: Utc::now(),
            },
        );
        self.save(&ratings)
    }

    pub fn get(&self, movie_id: u32) -> Result<Option<RatingEntry>, RatingError> {
        Ok(self.load()?.remove(&movie_id))
    }

    pub fn remove(&self, movie_id: u32) -> Result<(), RatingError> {
        let mut ratings = self.load()?;
        if ratings.remove(&movie_id).is_some() {
            self.save(&ratings)?;
        }
        Ok(())
    }

    /// All ratings, keyed by movie id.
    pub fn all(&self) -> Result<BTreeMap<u32, RatingEntry>, RatingError> {
        self.load()
    }

    pub fn clear(&self) -> Result<(), RatingError> {
        self.store.remove(KEY_RATINGS)?;
        Ok(())
    }

    pub fn stats(&self) -> Result<RatingStats, RatingError> {
        let ratings = self.load()?;
        let total = ratings.len();
        if total == 0 {
            return Ok(RatingStats {
                total: 0,
                average: 0.0,
                highest: None,
                lowest: None,
            });
        }
        let sum: u64 = ratings.values().map(|e| e.rating as u64).sum();
        let average = (sum as f64 / total as f64 * 10.0).round() / 10.0;
        // Ties break toward the lowest movie id.
        let highest = ratings
            .iter()
            .max_by(|a, b| a.1.rating.cmp(&b.1.rating).then_with(|| b.0.cmp(a.0)))
            .map(|(id, e)| (*id, e.clone()));
        let lowest = ratings
            .iter()
            .min_by(|a, b| a.1.rating.cmp(&b.1.rating).then_with(|| a.0.cmp(b.0)))
            .map(|(id, e)| (*id, e.clone()));
        Ok(RatingStats {
            total,
            average,
            highest,
            lowest,
        })
    }

    fn load(&self) -> Result<BTreeMap<u32, RatingEntry>, RatingError> {
        match self.store.get(KEY_RATINGS)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn save(&self, ratings: &BTreeMap<u32, RatingEntry>) -> Result<(), RatingError> {
        let json = serde_json::to_string(ratings)?;
        self.store.set(KEY_RATINGS, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ratings() -> RatingStore {
        RatingStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_set_get_roundtrip() {
        let store = ratings();
        store.set(603, 9, "The Matrix").unwrap();
        let entry = store.get(603).unwrap().unwrap();
        assert_eq!(entry.rating, 9);
        assert_eq!(entry.title, "The Matrix");
    }

    #[test]
    fn test_set_replaces_previous_rating() {
        let store = ratings();
        store.set(603, 5, "The Matrix").unwrap();
        store.set(603, 10, "The Matrix").unwrap();
        assert_eq!(store.get(603).unwrap().unwrap().rating, 10);
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn test_rating_bounds_enforced() {
        let store = ratings();
        assert!(matches!(
            store.set(1, 0, "x"),
            Err(RatingError::OutOfRange(0))
        ));
        assert!(matches!(
            store.set(1, 11, "x"),
            Err(RatingError::OutOfRange(11))
        ));
        assert!(store.set(1, 1, "x").is_ok());
        assert!(store.set(2, 10, "y").is_ok());
    }

    #[test]
    fn test_remove_and_clear() {
        let store = ratings();
        store.set(1, 5, "a").unwrap();
        store.set(2, 7, "b").unwrap();
        store.remove(1).unwrap();
        assert!(store.get(1).unwrap().is_none());
        assert!(store.get(2).unwrap().is_some());
        store.clear().unwrap();
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let store = ratings();
        store.remove(999).unwrap();
    }

    #[test]
    fn test_stats_empty() {
        let stats = ratings().stats().unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average, 0.0);
        assert!(stats.highest.is_none());
        assert!(stats.lowest.is_none());
    }

    #[test]
    fn test_stats_average_rounded_to_one_decimal() {
        let store = ratings();
        store.set(1, 7, "a").unwrap();
        store.set(2, 8, "b").unwrap();
        store.set(3, 8, "c").unwrap();
        // 23 / 3 = 7.666... -> 7.7
        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.average, 7.7);
        assert_eq!(stats.highest.unwrap().0, 2);
        assert_eq!(stats.lowest.unwrap().0, 1);
    }

    #[test]
    fn test_stats_ties_break_toward_lowest_id() {
        let store = ratings();
        store.set(5, 9, "e").unwrap();
        store.set(2, 9, "b").unwrap();
        store.set(7, 3, "g").unwrap();
        store.set(4, 3, "d").unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.highest.unwrap().0, 2);
        assert_eq!(stats.lowest.unwrap().0, 4);
    }
}

//! Accumulation of successive result pages into a running list.
//!
//! One accumulator instance belongs to one query epoch: a reset merge
//! starts the epoch, append merges extend it. Nothing here de-duplicates;
//! the upstream catalog is trusted not to repeat items across sequential
//! pages of the same query.

use crate::tmdb::{MoviePage, MovieSummary};

/// How an incoming page combines with what is already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Replace the accumulated list (new query epoch).
    Reset,
    /// Concatenate after the existing items ("load more").
    Append,
}

/// The growing list of everything loaded so far plus pagination counters.
#[derive(Debug, Clone, Default)]
pub struct PageAccumulator {
    movies: Vec<MovieSummary>,
    current_page: u32,
    total_pages: u32,
    total_count: u64,
}

impl PageAccumulator {
    pub fn new() -> Self {
        Self {
            movies: vec![],
            current_page: 1,
            total_pages: 1,
            total_count: 0,
        }
    }

    /// Merge an already-refined page of results. `incoming` replaces or
    /// extends the list depending on `mode`; pagination metadata always
    /// comes from the latest page.
    pub fn merge(&mut self, page: &MoviePage, incoming: Vec<MovieSummary>, mode: MergeMode) {
        match mode {
            MergeMode::Reset => self.movies = incoming,
            MergeMode::Append => self.movies.extend(incoming),
        }
        self.current_page = page.page;
        self.total_pages = page.total_pages.max(1);
        self.total_count = page.total_count;
    }

    /// Back to the empty page-1 state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn movies(&self) -> &[MovieSummary] {
        &self.movies
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: u32) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("movie-{}", id),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: None,
            vote_count: None,
            popularity: None,
            genre_ids: vec![],
            adult: false,
        }
    }

    fn page(n: u32, total_pages: u32, ids: &[u32]) -> (MoviePage, Vec<MovieSummary>) {
        let results: Vec<MovieSummary> = ids.iter().map(|id| movie(*id)).collect();
        let page = MoviePage {
            results: results.clone(),
            page: n,
            total_pages,
            total_count: (total_pages as u64) * 20,
        };
        (page, results)
    }

    #[test]
    fn test_reset_replaces_regardless_of_prior_size() {
        let mut acc = PageAccumulator::new();
        let (p1, items1) = page(1, 5, &[1, 2, 3]);
        acc.merge(&p1, items1, MergeMode::Reset);
        let (p2, items2) = page(2, 5, &[4, 5, 6]);
        acc.merge(&p2, items2, MergeMode::Append);
        assert_eq!(acc.movies().len(), 6);

        let (fresh, fresh_items) = page(1, 2, &[9]);
        acc.merge(&fresh, fresh_items, MergeMode::Reset);
        assert_eq!(acc.movies().len(), 1);
        assert_eq!(acc.movies()[0].id, 9);
        assert_eq!(acc.current_page(), 1);
        assert_eq!(acc.total_pages(), 2);
    }

    #[test]
    fn test_append_preserves_order_and_length() {
        let mut acc = PageAccumulator::new();
        let (p1, items1) = page(1, 3, &[1, 2]);
        acc.merge(&p1, items1, MergeMode::Reset);
        let (p2, items2) = page(2, 3, &[3, 4]);
        acc.merge(&p2, items2, MergeMode::Append);

        let ids: Vec<u32> = acc.movies().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_append_does_not_deduplicate() {
        let mut acc = PageAccumulator::new();
        let (p1, items1) = page(1, 2, &[1, 2]);
        acc.merge(&p1, items1, MergeMode::Reset);
        let (p2, items2) = page(2, 2, &[2, 3]);
        acc.merge(&p2, items2, MergeMode::Append);
        // Upstream paging is a trust boundary; duplicates pass through.
        assert_eq!(acc.movies().len(), 4);
    }

    #[test]
    fn test_has_more_tracks_latest_metadata() {
        let mut acc = PageAccumulator::new();
        assert!(!acc.has_more());

        let (p1, items1) = page(1, 3, &[1]);
        acc.merge(&p1, items1, MergeMode::Reset);
        assert!(acc.has_more());

        let (p3, items3) = page(3, 3, &[2]);
        acc.merge(&p3, items3, MergeMode::Append);
        assert!(!acc.has_more());
    }

    #[test]
    fn test_reset_returns_to_empty_state() {
        let mut acc = PageAccumulator::new();
        let (p1, items1) = page(1, 3, &[1, 2]);
        acc.merge(&p1, items1, MergeMode::Reset);
        acc.reset();
        assert!(acc.movies().is_empty());
        assert_eq!(acc.current_page(), 1);
        assert_eq!(acc.total_pages(), 1);
        assert_eq!(acc.total_count(), 0);
    }

    #[test]
    fn test_zero_total_pages_is_normalized() {
        let mut acc = PageAccumulator::new();
        let p = MoviePage {
            results: vec![],
            page: 1,
            total_pages: 0,
            total_count: 0,
        };
        acc.merge(&p, vec![], MergeMode::Reset);
        assert_eq!(acc.total_pages(), 1);
        assert!(!acc.has_more());
    }
}

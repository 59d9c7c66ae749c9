//! Client-side refinement: supplementary filtering and deterministic
//! sorting of a result page.
//!
//! The search endpoint ignores structured filters, so search-mode results
//! are re-filtered here. Discover-mode results arrive already filtered;
//! running them through `filter_movies` again removes nothing, which keeps
//! `refine` idempotent in both modes. Pure functions, no I/O; inputs are
//! never mutated.

use std::cmp::Ordering;

use chrono::NaiveDate;
use once_cell::sync::Lazy;

use super::params::{QueryParams, SortKey};
use crate::tmdb::MovieSummary;

/// Apply adult/genre/year/rating filters. Each bound is optional and
/// open-ended on its missing side.
pub fn filter_movies(movies: &[MovieSummary], params: &QueryParams) -> Vec<MovieSummary> {
    movies
        .iter()
        .filter(|movie| matches_filters(movie, params))
        .cloned()
        .collect()
}

fn matches_filters(movie: &MovieSummary, params: &QueryParams) -> bool {
    if movie.adult {
        return false;
    }

    if !params.genres.is_empty() {
        let has_match = movie.genre_ids.iter().any(|id| params.genres.contains(id));
        if !has_match {
            return false;
        }
    }

    if params.year_from.is_some() || params.year_to.is_some() {
        // A movie without a release date cannot satisfy a year bound.
        let Some(year) = movie.release_year() else {
            return false;
        };
        if let Some(from) = params.year_from {
            if year < from {
                return false;
            }
        }
        if let Some(to) = params.year_to {
            if year > to {
                return false;
            }
        }
    }

    if let Some(min) = params.rating_min {
        if movie.vote_average.unwrap_or(0.0) < min {
            return false;
        }
    }
    if let Some(max) = params.rating_max {
        if movie.vote_average.unwrap_or(0.0) > max {
            return false;
        }
    }

    true
}

/// Stable sort by the given key; equal-key elements keep their relative
/// order. Missing numeric values compare as 0, missing or unparsable dates
/// as the epoch (oldest), and titles case-insensitively.
pub fn sort_movies(mut movies: Vec<MovieSummary>, sort_by: SortKey) -> Vec<MovieSummary> {
    match sort_by {
        SortKey::PopularityDesc => {
            movies.sort_by(|a, b| cmp_f32(b.popularity, a.popularity));
        }
        SortKey::PopularityAsc => {
            movies.sort_by(|a, b| cmp_f32(a.popularity, b.popularity));
        }
        SortKey::VoteAverageDesc => {
            movies.sort_by(|a, b| cmp_f32(b.vote_average, a.vote_average));
        }
        SortKey::VoteAverageAsc => {
            movies.sort_by(|a, b| cmp_f32(a.vote_average, b.vote_average));
        }
        SortKey::ReleaseDateDesc => {
            movies.sort_by(|a, b| date_value(b).cmp(&date_value(a)));
        }
        SortKey::ReleaseDateAsc => {
            movies.sort_by(|a, b| date_value(a).cmp(&date_value(b)));
        }
        SortKey::TitleAsc => {
            movies.sort_by(|a, b| cmp_title(a, b));
        }
        SortKey::TitleDesc => {
            movies.sort_by(|a, b| cmp_title(b, a));
        }
    }
    movies
}

/// Filter then sort. Search-mode callers use this; discover-mode callers
/// may too, since re-filtering server-filtered results is a no-op.
pub fn refine(movies: &[MovieSummary], params: &QueryParams) -> Vec<MovieSummary> {
    sort_movies(filter_movies(movies, params), params.sort_by)
}

fn cmp_f32(a: Option<f32>, b: Option<f32>) -> Ordering {
    a.unwrap_or(0.0).total_cmp(&b.unwrap_or(0.0))
}

static EPOCH: Lazy<NaiveDate> = Lazy::new(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());

fn date_value(movie: &MovieSummary) -> NaiveDate {
    movie
        .release_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or(*EPOCH)
}

fn cmp_title(a: &MovieSummary, b: &MovieSummary) -> Ordering {
    let a = a.title.to_lowercase();
    let b = b.title.to_lowercase();
    a.cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: u32, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
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

    #[test]
    fn test_adult_movies_are_dropped() {
        let mut flagged = movie(1, "Flagged");
        flagged.adult = true;
        let movies = vec![flagged, movie(2, "Fine")];

        let kept = filter_movies(&movies, &QueryParams::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 2);
    }

    #[test]
    fn test_genre_filter_is_an_or_match() {
        let mut action = movie(1, "Action");
        action.genre_ids = vec![28];
        let mut drama = movie(2, "Drama");
        drama.genre_ids = vec![18];
        let mut both = movie(3, "Both");
        both.genre_ids = vec![18, 28];

        let params = QueryParams {
            genres: [28, 12].into_iter().collect(),
            ..QueryParams::default()
        };
        let kept = filter_movies(&[action, drama, both], &params);
        let ids: Vec<u32> = kept.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_year_bounds_drop_dateless_movies() {
        let mut dated = movie(1, "Dated");
        dated.release_date = Some("2021-06-15".to_string());
        let dateless = movie(2, "Dateless");

        let params = QueryParams {
            year_from: Some(2020),
            ..QueryParams::default()
        };
        let kept = filter_movies(&[dated, dateless], &params);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
    }

    #[test]
    fn test_year_bounds_are_inclusive_and_open_ended() {
        let mut m2019 = movie(1, "a");
        m2019.release_date = Some("2019-12-31".to_string());
        let mut m2020 = movie(2, "b");
        m2020.release_date = Some("2020-01-01".to_string());
        let mut m2024 = movie(3, "c");
        m2024.release_date = Some("2024-05-05".to_string());
        let movies = vec![m2019, m2020, m2024];

        let from_only = QueryParams {
            year_from: Some(2020),
            ..QueryParams::default()
        };
        let ids: Vec<u32> = filter_movies(&movies, &from_only)
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![2, 3]);

        let to_only = QueryParams {
            year_to: Some(2020),
            ..QueryParams::default()
        };
        let ids: Vec<u32> = filter_movies(&movies, &to_only)
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_rating_bounds_are_inclusive() {
        let mut low = movie(1, "low");
        low.vote_average = Some(5.0);
        let mut exact = movie(2, "exact");
        exact.vote_average = Some(7.0);
        let mut high = movie(3, "high");
        high.vote_average = Some(9.0);

        let params = QueryParams {
            rating_min: Some(7.0),
            rating_max: Some(9.0),
            ..QueryParams::default()
        };
        let ids: Vec<u32> = filter_movies(&[low, exact, high], &params)
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_missing_rating_counts_as_zero() {
        let unrated = movie(1, "unrated");
        let params = QueryParams {
            rating_min: Some(1.0),
            ..QueryParams::default()
        };
        assert!(filter_movies(&[unrated], &params).is_empty());
    }

    #[test]
    fn test_sort_popularity_treats_missing_as_zero() {
        let mut a = movie(1, "a");
        a.popularity = Some(10.0);
        let b = movie(2, "b");
        let mut c = movie(3, "c");
        c.popularity = Some(50.0);

        let sorted = sort_movies(vec![a, b, c], SortKey::PopularityDesc);
        let ids: Vec<u32> = sorted.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let mut movies: Vec<MovieSummary> = (1..=5).map(|i| movie(i, "same")).collect();
        for m in &mut movies {
            m.vote_average = Some(7.0);
        }
        let sorted = sort_movies(movies, SortKey::VoteAverageDesc);
        let ids: Vec<u32> = sorted.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_sort_missing_dates_as_oldest() {
        let undated = movie(1, "undated");
        let mut newer = movie(2, "newer");
        newer.release_date = Some("2020-01-01".to_string());
        let mut older = movie(3, "older");
        older.release_date = Some("1985-07-03".to_string());

        let sorted = sort_movies(vec![undated.clone(), newer, older], SortKey::ReleaseDateAsc);
        let ids: Vec<u32> = sorted.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_sort_title_is_case_insensitive() {
        let sorted = sort_movies(
            vec![movie(1, "zulu"), movie(2, "Alpha"), movie(3, "mike")],
            SortKey::TitleAsc,
        );
        let ids: Vec<u32> = sorted.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_refine_is_idempotent() {
        let mut a = movie(1, "a");
        a.vote_average = Some(8.0);
        a.genre_ids = vec![28];
        a.release_date = Some("2021-01-01".to_string());
        let mut b = movie(2, "b");
        b.vote_average = Some(6.0);
        b.genre_ids = vec![28];
        b.release_date = Some("2022-01-01".to_string());
        let mut adult = movie(3, "x");
        adult.adult = true;

        let params = QueryParams {
            genres: [28].into_iter().collect(),
            sort_by: SortKey::VoteAverageDesc,
            ..QueryParams::default()
        };

        let once = refine(&[a, b, adult], &params);
        let twice = refine(&once, &params);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_refine_does_not_mutate_input() {
        let movies = vec![movie(2, "b"), movie(1, "a")];
        let _ = refine(&movies, &QueryParams::default());
        assert_eq!(movies[0].id, 2);
    }
}

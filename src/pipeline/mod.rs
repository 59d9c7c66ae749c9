//! The browse pipeline: debounced query propagation, request supervision,
//! and page accumulation behind a single state surface.
//!
//! One pipeline instance backs one view. Changing the query params starts a
//! new epoch: the accumulated list resets, any in-flight request is
//! superseded, and a fresh page-1 fetch begins. Supersession is enforced
//! twice over: the old request's cancellation token is cancelled, and even
//! a completion that slips through is discarded unless its generation is
//! still current.

mod debounce;

pub use debounce::{DebounceGate, FILTER_QUIET_PERIOD};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::query::{refine, sort_movies, MergeMode, PageAccumulator, QueryParams};
use crate::tmdb::{MoviePage, MovieSource, MovieSummary, TmdbError};

/// Immutable view of the pipeline for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseSnapshot {
    pub params: QueryParams,
    pub movies: Vec<MovieSummary>,
    /// True only while a reset-mode page-1 request is outstanding.
    pub is_loading_initial: bool,
    /// True only while an append-mode request is outstanding.
    pub is_loading_more: bool,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_more: bool,
    pub error: Option<String>,
}

struct PipelineState {
    params: QueryParams,
    accumulator: PageAccumulator,
    is_loading_initial: bool,
    is_loading_more: bool,
    error: Option<String>,
    /// Whether any epoch has started; lets the first set_params through
    /// even when it equals the default params.
    started: bool,
}

struct PipelineInner {
    source: Arc<dyn MovieSource>,
    state: Mutex<PipelineState>,
    /// Monotonic epoch counter; a completion is applied only if its
    /// generation is still the latest.
    generation: AtomicU64,
    /// Token of the in-flight request, cancelled on supersession.
    in_flight: Mutex<Option<CancellationToken>>,
    debounce: DebounceGate,
}

/// Handle to a browse pipeline instance. Clones share state.
#[derive(Clone)]
pub struct BrowsePipeline {
    inner: Arc<PipelineInner>,
}

impl BrowsePipeline {
    pub fn new(source: Arc<dyn MovieSource>) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                source,
                state: Mutex::new(PipelineState {
                    params: QueryParams::default(),
                    accumulator: PageAccumulator::new(),
                    is_loading_initial: false,
                    is_loading_more: false,
                    error: None,
                    started: false,
                }),
                generation: AtomicU64::new(0),
                in_flight: Mutex::new(None),
                debounce: DebounceGate::new(FILTER_QUIET_PERIOD),
            }),
        }
    }

    /// Apply a filter/sort edit. Debounced: rapid successive calls collapse
    /// into one query carrying the last params; the very first call runs
    /// immediately. A no-op when the params did not actually change.
    pub fn set_params(&self, params: QueryParams) {
        let unchanged = {
            let state = self.inner.state.lock().unwrap();
            state.started && state.params == params
        };
        if unchanged {
            // Reverting to the already-applied params within the quiet
            // period also drops the edit being reverted; otherwise the
            // stale edit would still fire.
            self.inner.debounce.cancel_pending();
            return;
        }
        let inner = Arc::clone(&self.inner);
        self.inner
            .debounce
            .schedule(move || inner.issue(params, 1, MergeMode::Reset));
    }

    /// Explicit search submission: replaces the text query, keeps the
    /// current filters, and bypasses the debounce entirely.
    pub fn submit_search(&self, text: &str) {
        let params = {
            let state = self.inner.state.lock().unwrap();
            QueryParams {
                query: text.trim().to_string(),
                ..state.params.clone()
            }
        };
        self.inner.debounce.cancel_pending();
        self.inner.debounce.mark_started();
        Arc::clone(&self.inner).issue(params, 1, MergeMode::Reset);
    }

    /// Fetch the next page and append it. Ignored while any request is
    /// outstanding or when the last page is already loaded.
    pub fn load_more(&self) {
        let (params, next_page) = {
            let state = self.inner.state.lock().unwrap();
            if state.is_loading_initial || state.is_loading_more {
                return;
            }
            if !state.accumulator.has_more() {
                return;
            }
            (state.params.clone(), state.accumulator.current_page() + 1)
        };
        Arc::clone(&self.inner).issue(params, next_page, MergeMode::Append);
    }

    /// Re-run the current epoch from page 1 (the retry affordance after an
    /// initial-load failure).
    pub fn retry(&self) {
        let params = self.inner.state.lock().unwrap().params.clone();
        self.inner.debounce.cancel_pending();
        self.inner.debounce.mark_started();
        Arc::clone(&self.inner).issue(params, 1, MergeMode::Reset);
    }

    /// Current state surface.
    pub fn snapshot(&self) -> BrowseSnapshot {
        let state = self.inner.state.lock().unwrap();
        BrowseSnapshot {
            params: state.params.clone(),
            movies: state.accumulator.movies().to_vec(),
            is_loading_initial: state.is_loading_initial,
            is_loading_more: state.is_loading_more,
            current_page: state.accumulator.current_page(),
            total_pages: state.accumulator.total_pages(),
            total_count: state.accumulator.total_count(),
            has_more: state.accumulator.has_more(),
            error: state.error.clone(),
        }
    }

    /// Tear the pipeline down: no pending debounce fires, no in-flight
    /// completion is applied.
    pub fn shutdown(&self) {
        self.inner.debounce.cancel_pending();
        // Invalidate any completion racing the shutdown.
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.inner.in_flight.lock().unwrap().take() {
            token.cancel();
        }
    }
}

impl PipelineInner {
    fn issue(self: Arc<Self>, params: QueryParams, page: u32, mode: MergeMode) {
        // Supersede whatever is in flight before touching state.
        let token = CancellationToken::new();
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if let Some(previous) = in_flight.replace(token.clone()) {
                previous.cancel();
            }
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state.lock().unwrap();
            state.error = None;
            state.started = true;
            match mode {
                MergeMode::Reset => {
                    state.params = params.clone();
                    state.accumulator.reset();
                    state.is_loading_initial = true;
                    state.is_loading_more = false;
                }
                MergeMode::Append => {
                    state.is_loading_more = true;
                }
            }
        }

        debug!(
            "Issuing {:?} query (generation {}, page {}, search_mode={})",
            mode,
            generation,
            page,
            params.is_search_mode()
        );

        let inner = Arc::clone(&self);
        tokio::spawn(async move {
            let result = if params.is_search_mode() {
                inner.source.search(&params.query, page, &token).await
            } else {
                inner.source.discover(&params, page, &token).await
            };
            inner.complete(generation, &params, mode, result);
        });
    }

    fn complete(
        &self,
        generation: u64,
        params: &QueryParams,
        mode: MergeMode,
        result: Result<MoviePage, TmdbError>,
    ) {
        // A newer issue owns the state and the loading flags now; discard
        // this completion unconditionally.
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded completion (generation {})", generation);
            return;
        }

        let mut state = self.state.lock().unwrap();
        match result {
            Ok(page) => {
                // Search results need the client-side filters the search
                // endpoint ignores; discover results are already filtered
                // server-side and only get the deterministic sort.
                let incoming = if params.is_search_mode() {
                    refine(&page.results, params)
                } else {
                    sort_movies(page.results.clone(), params.sort_by)
                };
                state.accumulator.merge(&page, incoming, mode);
            }
            Err(e) if e.is_cancelled() => {
                // Superseded request; never surfaced.
            }
            Err(e) => {
                warn!("Movie query failed ({:?} mode): {}", mode, e);
                if mode == MergeMode::Reset {
                    state.accumulator.reset();
                } // append failure keeps prior progress
                state.error = Some(e.to_string());
            }
        }
        state.is_loading_initial = false;
        state.is_loading_more = false;
    }
}

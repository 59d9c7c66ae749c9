//! Mock movie source for testing the query pipeline.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::query::QueryParams;
use crate::tmdb::{MoviePage, MovieSource, TmdbError};

/// A recorded pipeline query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedQuery {
    Search { query: String, page: u32 },
    Discover { params: QueryParams, page: u32 },
}

struct Scripted {
    result: Result<MoviePage, TmdbError>,
    delay: Duration,
}

/// Mock implementation of the `MovieSource` trait.
///
/// Responses are scripted as a FIFO queue shared by `search` and
/// `discover`, matching the call order the test drives. An empty queue
/// yields empty pages. Delayed responses let tests exercise supersession:
/// the mock honors the cancellation token while waiting.
#[derive(Default)]
pub struct MockMovieSource {
    responses: Mutex<VecDeque<Scripted>>,
    queries: Mutex<Vec<RecordedQuery>>,
}

impl MockMovieSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next response, served immediately.
    pub fn enqueue(&self, result: Result<MoviePage, TmdbError>) {
        self.enqueue_with_delay(result, Duration::ZERO);
    }

    /// Script the next response, served after `delay` (cancellable).
    pub fn enqueue_with_delay(&self, result: Result<MoviePage, TmdbError>, delay: Duration) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted { result, delay });
    }

    /// All queries issued so far, in order.
    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }

    async fn respond(&self, cancel: &CancellationToken) -> Result<MoviePage, TmdbError> {
        let scripted = self.responses.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            return Ok(MoviePage::empty());
        };
        if !scripted.delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TmdbError::Cancelled),
                _ = tokio::time::sleep(scripted.delay) => {}
            }
        } else if cancel.is_cancelled() {
            return Err(TmdbError::Cancelled);
        }
        scripted.result
    }
}

#[async_trait]
impl MovieSource for MockMovieSource {
    async fn search(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<MoviePage, TmdbError> {
        self.queries.lock().unwrap().push(RecordedQuery::Search {
            query: query.to_string(),
            page,
        });
        self.respond(cancel).await
    }

    async fn discover(
        &self,
        params: &QueryParams,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<MoviePage, TmdbError> {
        self.queries.lock().unwrap().push(RecordedQuery::Discover {
            params: params.clone(),
            page,
        });
        self.respond(cancel).await
    }
}

//! Mock transport for testing without network access.
//!
//! Serves documents from an in-memory map and records how many requests
//! were in flight at once, which is how the concurrency ceiling is
//! verified.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::error::FetchError;
use super::{Fetch, FetchResponse};

enum MockResponse {
    Body(String),
    Error(String),
}

/// In-memory transport serving pre-registered documents.
///
/// URLs with no registered document answer with a 404-style status error;
/// registered errors surface as transport failures. An optional per-request
/// delay keeps requests overlapping long enough for concurrency assertions.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<Url, MockResponse>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Create an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every request by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Register a document body for a URL.
    pub fn insert(&self, url: Url, body: impl Into<String>) {
        self.lock_responses()
            .insert(url, MockResponse::Body(body.into()));
    }

    /// Register a transport failure for a URL.
    pub fn insert_error(&self, url: Url, message: impl Into<String>) {
        self.lock_responses()
            .insert(url, MockResponse::Error(message.into()));
    }

    /// Highest number of requests observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, HashMap<Url, MockResponse>> {
        // The lock is only poisoned if a test already panicked.
        self.responses.lock().expect("mock transport lock poisoned")
    }
}

#[async_trait]
impl Fetch for MockTransport {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match self.lock_responses().get(url) {
            Some(MockResponse::Body(body)) => Ok(FetchResponse {
                status: 200,
                body: body.clone(),
            }),
            Some(MockResponse::Error(message)) => Err(FetchError::Transport(message.clone())),
            None => Err(FetchError::Status {
                url: url.clone(),
                status: 404,
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

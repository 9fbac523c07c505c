//! Pull-based pagination stream over one feed URL.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::Stream;
use tracing::debug;
use url::Url;

use crate::domain::Connection;
use crate::feed::{DecodeError, Page, decode_page};
use crate::fetch::{BoundedClient, Fetch, FetchError};

/// Error that terminates a [`ConnectionStream`].
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The page fetch failed.
    #[error("page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The page could not be decoded.
    #[error("page decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// A lazily fetched sequence of connections from one entry point,
/// followed page by page along the feed's next links.
///
/// The stream performs no I/O until [`next`](Self::next) is pulled with an
/// empty buffer, so a slow consumer naturally holds back fetching. Records
/// come out in server order: in-page order within a page, pages strictly
/// in next-link order.
///
/// A fetch or decode failure is yielded exactly once and terminates the
/// stream; an empty page ends the stream without an error even when a
/// next link is present.
pub struct ConnectionStream<T> {
    http: Arc<BoundedClient<T>>,
    cursor: Option<Url>,
    buffer: VecDeque<Connection>,
    closed: Arc<AtomicBool>,
    done: bool,
}

impl<T: Fetch> ConnectionStream<T> {
    /// Create a stream starting at `first_page`.
    pub fn new(first_page: Url, http: Arc<BoundedClient<T>>) -> Self {
        Self::with_close_flag(first_page, http, Arc::new(AtomicBool::new(false)))
    }

    /// Create a stream sharing an externally owned close flag.
    pub(crate) fn with_close_flag(
        first_page: Url,
        http: Arc<BoundedClient<T>>,
        closed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            http,
            cursor: Some(first_page),
            buffer: VecDeque::new(),
            closed,
            done: false,
        }
    }

    /// Stop fetching. Buffered records still drain; results of a fetch in
    /// flight are discarded.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Pull the next connection.
    ///
    /// Returns `None` once the feed is exhausted or the stream was closed;
    /// a terminal failure is yielded once before the stream goes quiet.
    pub async fn next(&mut self) -> Option<Result<Connection, StreamError>> {
        if self.done {
            return None;
        }

        if let Some(connection) = self.buffer.pop_front() {
            return Some(Ok(connection));
        }

        if self.closed.load(Ordering::Acquire) {
            self.done = true;
            return None;
        }

        let Some(url) = self.cursor.take() else {
            self.done = true;
            return None;
        };

        let page = match self.fetch_page(&url).await {
            Ok(page) => page,
            Err(error) => {
                self.done = true;
                return Some(Err(error));
            }
        };

        // Closed while the fetch was in flight: discard the result.
        if self.closed.load(Ordering::Acquire) {
            self.done = true;
            return None;
        }

        self.cursor = page.next;

        if page.connections.is_empty() {
            // Following the next link of a recordless page risks walking
            // empty windows forever; treat it as end of stream.
            debug!(url = %url, "empty page, ending stream");
            self.done = true;
            return None;
        }

        self.buffer.extend(page.connections);
        self.buffer.pop_front().map(Ok)
    }

    /// Adapt into a [`futures::Stream`] of results.
    pub fn into_stream(self) -> impl Stream<Item = Result<Connection, StreamError>> {
        futures::stream::unfold(self, |mut inner| async move {
            inner.next().await.map(|item| (item, inner))
        })
    }

    async fn fetch_page(&self, url: &Url) -> Result<Page, StreamError> {
        debug!(url = %url, "fetching page");
        let response = self.http.get(url).await?;
        Ok(decode_page(&response.body)?)
    }
}

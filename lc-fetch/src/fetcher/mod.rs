//! Fetch orchestration.
//!
//! [`Fetcher`] owns the bounded client and the configured entry points,
//! and starts one stream per entry point in the chosen strategy. It is
//! the only component allowed to close the whole set at once: closing
//! stops every stream's next fetch while leaving in-flight requests to
//! finish and be discarded.

mod config;

pub use config::FetcherConfig;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::{GeoPoint, StopId};
use crate::feed::{EntryResolver, ResolutionError};
use crate::fetch::{BoundedClient, ClientConfig, Fetch, FetchError, FetchEvent, HttpTransport};
use crate::stream::{CandidateStop, ConnectionStream, NeighbourStream};

/// Capacity of the chosen-candidate event channel.
const CANDIDATE_CHANNEL_CAPACITY: usize = 256;

/// Error starting a fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// The query lacks a field the chosen strategy needs.
    #[error("invalid query: {0}")]
    InvalidQuery(&'static str),

    /// Every configured entry point failed to resolve a first page.
    #[error("all entry points failed to resolve: {0}")]
    Resolution(#[from] ResolutionError),

    /// The HTTP client could not be built.
    #[error("client setup failed: {0}")]
    Client(#[from] FetchError),
}

/// A route query driving the fetch.
#[derive(Debug, Clone)]
pub struct Query {
    /// Stop the journey departs from.
    pub departure_stop: StopId,

    /// Earliest departure instant.
    pub departure_time: DateTime<Utc>,

    /// Goal stop, when known.
    pub arrival_stop: Option<StopId>,

    /// Goal coordinates; required by the heuristic strategy.
    pub arrival_location: Option<GeoPoint>,
}

impl Query {
    /// Create a query departing from `departure_stop` at `departure_time`.
    pub fn new(departure_stop: StopId, departure_time: DateTime<Utc>) -> Self {
        Self {
            departure_stop,
            departure_time,
            arrival_stop: None,
            arrival_location: None,
        }
    }

    /// Set the goal stop.
    pub fn with_arrival_stop(mut self, stop: StopId) -> Self {
        self.arrival_stop = Some(stop);
        self
    }

    /// Set the goal coordinates.
    pub fn with_arrival_location(mut self, location: GeoPoint) -> Self {
        self.arrival_location = Some(location);
        self
    }
}

/// Per-entry-point pagination streams produced by the regular strategy.
pub enum RegularStreams<T> {
    /// Exactly one entry point was configured; use the stream directly.
    Single(ConnectionStream<T>),

    /// Several entry points. Hand these to a time-ordered merge: each
    /// stream's output is delivered in served page order, which is the
    /// per-input ordering a non-decreasing-departure-time merge needs.
    PerEntryPoint(Vec<ConnectionStream<T>>),
}

/// Orchestrates the per-entry-point streams for one query.
pub struct Fetcher<T = HttpTransport> {
    config: FetcherConfig,
    http: Arc<BoundedClient<T>>,
    closed: Arc<AtomicBool>,
    candidates: broadcast::Sender<CandidateStop>,
}

impl Fetcher<HttpTransport> {
    /// Create a fetcher with an HTTP transport per the configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetcherError> {
        let client = BoundedClient::new(
            ClientConfig::new()
                .with_max_concurrent(config.max_concurrent)
                .with_timeout(config.timeout_secs),
        )?;
        Ok(Self::with_client(config, client))
    }
}

impl<T: Fetch> Fetcher<T> {
    /// Create a fetcher over an already-built bounded client. Tests use
    /// this with a mock transport.
    pub fn with_client(config: FetcherConfig, client: BoundedClient<T>) -> Self {
        let (candidates, _) = broadcast::channel(CANDIDATE_CHANNEL_CAPACITY);
        Self {
            config,
            http: Arc::new(client),
            closed: Arc::new(AtomicBool::new(false)),
            candidates,
        }
    }

    /// Subscribe to the client's request lifecycle events.
    pub fn subscribe_requests(&self) -> broadcast::Receiver<FetchEvent> {
        self.http.subscribe()
    }

    /// Subscribe to chosen-candidate notifications from every heuristic
    /// stream started by this fetcher.
    pub fn subscribe_candidates(&self) -> broadcast::Receiver<CandidateStop> {
        self.candidates.subscribe()
    }

    /// Start the regular, time-ordered strategy: one pagination stream
    /// per entry point, each starting at the page covering the query's
    /// departure time.
    pub async fn start_regular(&self, query: &Query) -> Result<RegularStreams<T>, FetcherError> {
        self.start_paged(query, None).await
    }

    /// Start the regular strategy with stop-window entry resolution: the
    /// first page is the one covering both the departure time and the
    /// departure stop, skipping pages the planner would discard anyway.
    pub async fn start_speedup(&self, query: &Query) -> Result<RegularStreams<T>, FetcherError> {
        self.start_paged(query, Some(&query.departure_stop)).await
    }

    async fn start_paged(
        &self,
        query: &Query,
        stop: Option<&StopId>,
    ) -> Result<RegularStreams<T>, FetcherError> {
        if self.config.entrypoints.is_empty() {
            return Err(FetcherError::InvalidQuery("no entry points configured"));
        }

        let resolutions = self.config.entrypoints.iter().map(|entrypoint| {
            let resolver = EntryResolver::new(entrypoint.clone(), Arc::clone(&self.http));
            async move {
                let result = resolver.first_url(query.departure_time, stop).await;
                (entrypoint.clone(), result)
            }
        });
        let resolved = futures::future::join_all(resolutions).await;

        let mut streams = Vec::new();
        let mut first_error = None;
        for (entrypoint, result) in resolved {
            match result {
                Ok(first_page) => streams.push(ConnectionStream::with_close_flag(
                    first_page,
                    Arc::clone(&self.http),
                    Arc::clone(&self.closed),
                )),
                Err(error) => {
                    warn!(entrypoint = %entrypoint, %error, "entry point skipped");
                    first_error.get_or_insert(error);
                }
            }
        }

        if streams.is_empty() {
            return Err(match first_error {
                Some(error) => FetcherError::Resolution(error),
                None => FetcherError::InvalidQuery("no entry points configured"),
            });
        }

        if streams.len() == 1 {
            return Ok(RegularStreams::Single(streams.remove(0)));
        }
        Ok(RegularStreams::PerEntryPoint(streams))
    }

    /// Start the heuristic, stop-driven strategy: one independent
    /// neighbour stream per entry point, all reporting chosen candidates
    /// through [`subscribe_candidates`](Self::subscribe_candidates).
    pub fn start_heuristic(&self, query: &Query) -> Result<Vec<NeighbourStream<T>>, FetcherError> {
        let Some(goal) = query.arrival_location else {
            return Err(FetcherError::InvalidQuery(
                "heuristic strategy needs arrival coordinates",
            ));
        };
        if self.config.entrypoints.is_empty() {
            return Err(FetcherError::InvalidQuery("no entry points configured"));
        }

        Ok(self
            .config
            .entrypoints
            .iter()
            .map(|entrypoint| {
                NeighbourStream::new(
                    entrypoint.clone(),
                    query.departure_stop.clone(),
                    query.departure_time,
                    goal,
                    Arc::clone(&self.http),
                )
                .with_weights(self.config.weights.clone())
                .with_retry_interval(self.config.retry_interval_mins)
                .with_close_flag(Arc::clone(&self.closed))
                .with_candidate_channel(self.candidates.clone())
            })
            .collect())
    }

    /// Stop every stream started by this fetcher. Idempotent. Fetches
    /// already in flight finish and their results are discarded.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

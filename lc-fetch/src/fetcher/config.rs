//! Fetcher configuration.

use chrono::Duration;
use url::Url;

use crate::stream::HeuristicWeights;

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 20;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default requeue interval in minutes.
const DEFAULT_RETRY_INTERVAL_MINS: i64 = 300;

/// Configuration for a [`Fetcher`](super::Fetcher).
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Entry point base URLs, one per feed server.
    pub entrypoints: Vec<Url>,

    /// Maximum concurrent requests across all streams.
    pub max_concurrent: usize,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Minutes added to a served candidate's time window when it is
    /// requeued by the heuristic strategy.
    pub retry_interval_mins: i64,

    /// Composite score weights for the heuristic strategy.
    pub weights: HeuristicWeights,
}

impl FetcherConfig {
    /// Create a configuration for the given entry points with default
    /// limits.
    pub fn new(entrypoints: Vec<Url>) -> Self {
        Self {
            entrypoints,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_interval_mins: DEFAULT_RETRY_INTERVAL_MINS,
            weights: HeuristicWeights::default(),
        }
    }

    /// Set the maximum number of concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the requeue interval in minutes.
    pub fn with_retry_interval(mut self, minutes: i64) -> Self {
        self.retry_interval_mins = minutes;
        self
    }

    /// Set the heuristic score weights.
    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Returns the requeue interval as a Duration.
    pub fn retry_interval(&self) -> Duration {
        Duration::minutes(self.retry_interval_mins)
    }
}

//! Heuristic neighbour stream: best-first exploration of the stop graph.
//!
//! "Expanding a node" here means one paginated HTTP fetch for a stop's
//! outgoing connections. A priority queue orders stops by a normalized
//! composite score, biasing exploration toward stops likely to lead to a
//! fast route to the goal. A failed or empty probe is skipped and the
//! stop retries later at decayed priority, so one broken stop never
//! stalls the rest of the search.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use tracing::debug;
use url::Url;

use crate::domain::{Connection, GeoPoint, StopId};
use crate::feed::{EntryResolver, decode_page};
use crate::fetch::{BoundedClient, Fetch};

use super::heuristic::{HeuristicWeights, NormalizationState, SEED_PRIORITY};
use super::queue::{CandidateQueue, CandidateStop};

/// Default interval added to a served candidate's window on requeue.
const DEFAULT_RETRY_INTERVAL_MINS: i64 = 300;

/// Capacity of the chosen-candidate event channel.
const CANDIDATE_CHANNEL_CAPACITY: usize = 256;

/// A pull-based sequence of connections discovered by probing one stop at
/// a time, best first.
///
/// Seeded with the origin stop at the query departure time. Each pull
/// with an empty buffer dequeues the most promising candidate, requeues
/// it for a later window at half priority, resolves and fetches its page,
/// and feeds every discovered arrival stop back into the queue as a new
/// candidate. Per-candidate failures are recovered by moving on to the
/// next candidate within the same pull; the stream ends only when the
/// queue empties or it is closed.
pub struct NeighbourStream<T> {
    entry: EntryResolver<T>,
    http: Arc<BoundedClient<T>>,
    goal: GeoPoint,
    weights: HeuristicWeights,
    retry_interval: Duration,
    queue: CandidateQueue,
    norm: NormalizationState,
    buffer: VecDeque<Connection>,
    chosen: broadcast::Sender<CandidateStop>,
    closed: Arc<AtomicBool>,
}

impl<T: Fetch> NeighbourStream<T> {
    /// Create a stream exploring from `origin` toward `goal`.
    pub fn new(
        entrypoint: Url,
        origin: StopId,
        departure_time: DateTime<Utc>,
        goal: GeoPoint,
        http: Arc<BoundedClient<T>>,
    ) -> Self {
        let mut queue = CandidateQueue::new();
        queue.push(CandidateStop {
            stop: origin,
            minimum_departure: departure_time,
            priority: SEED_PRIORITY,
        });

        let (chosen, _) = broadcast::channel(CANDIDATE_CHANNEL_CAPACITY);

        Self {
            entry: EntryResolver::new(entrypoint, Arc::clone(&http)),
            http,
            goal,
            weights: HeuristicWeights::default(),
            retry_interval: Duration::minutes(DEFAULT_RETRY_INTERVAL_MINS),
            queue,
            norm: NormalizationState::new(),
            buffer: VecDeque::new(),
            chosen,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the composite score weights.
    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the requeue interval in minutes.
    pub fn with_retry_interval(mut self, minutes: i64) -> Self {
        self.retry_interval = Duration::minutes(minutes);
        self
    }

    /// Share an externally owned close flag.
    pub(crate) fn with_close_flag(mut self, closed: Arc<AtomicBool>) -> Self {
        self.closed = closed;
        self
    }

    /// Route chosen-candidate events into an externally owned channel.
    pub(crate) fn with_candidate_channel(mut self, chosen: broadcast::Sender<CandidateStop>) -> Self {
        self.chosen = chosen;
        self
    }

    /// Subscribe to chosen-candidate notifications.
    pub fn subscribe_candidates(&self) -> broadcast::Receiver<CandidateStop> {
        self.chosen.subscribe()
    }

    /// Stop probing. Buffered records still drain; results of a fetch in
    /// flight are discarded.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Pull the next connection.
    ///
    /// Returns `None` when every candidate is exhausted or the stream was
    /// closed. Per-candidate failures never surface here; an empty
    /// terminal stream means "no route material found".
    pub async fn next(&mut self) -> Option<Connection> {
        if let Some(connection) = self.buffer.pop_front() {
            return Some(connection);
        }

        loop {
            if self.closed.load(Ordering::Acquire) {
                return None;
            }

            let candidate = self.queue.pop()?;

            // Serve-then-requeue: the stop stays explorable at a later
            // window with half the urgency, so the queue cannot go empty
            // while any stop remains viable.
            self.queue.push(CandidateStop {
                stop: candidate.stop.clone(),
                minimum_departure: candidate.minimum_departure + self.retry_interval,
                priority: candidate.priority / 2.0,
            });

            let _ = self.chosen.send(candidate.clone());

            let url = match self
                .entry
                .first_url(candidate.minimum_departure, Some(&candidate.stop))
                .await
            {
                Ok(url) => url,
                Err(error) => {
                    debug!(stop = %candidate.stop, %error, "entry resolution failed, trying next candidate");
                    continue;
                }
            };

            let page = match self.http.get(&url).await {
                Ok(response) => match decode_page(&response.body) {
                    Ok(page) => page,
                    Err(error) => {
                        debug!(stop = %candidate.stop, %error, "page decode failed, trying next candidate");
                        continue;
                    }
                },
                Err(error) => {
                    debug!(stop = %candidate.stop, %error, "page fetch failed, trying next candidate");
                    continue;
                }
            };

            // Closed while the fetch was in flight: discard the result.
            if self.closed.load(Ordering::Acquire) {
                return None;
            }

            if page.connections.is_empty() {
                debug!(stop = %candidate.stop, "empty page, trying next candidate");
                continue;
            }

            self.norm.observe(&page.connections, self.goal);

            for connection in &page.connections {
                let priority = self.norm.score(connection, self.goal, &self.weights);
                self.queue.push(CandidateStop {
                    stop: connection.arrival_stop.clone(),
                    minimum_departure: connection.arrival_time,
                    priority,
                });
            }

            self.buffer.extend(page.connections);
            return self.buffer.pop_front();
        }
    }

    /// Number of candidates currently queued.
    pub fn queued_candidates(&self) -> usize {
        self.queue.len()
    }
}

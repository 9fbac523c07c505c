//! Candidate priority queue for the neighbour stream.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use crate::domain::StopId;

/// A stop awaiting exploration.
///
/// The same stop id may appear several times with different time windows
/// and scores; the queue performs no deduplication. Rediscovering a stop
/// with a better score is how it climbs back up, and the serve-time
/// requeue relies on coexisting entries.
#[derive(Debug, Clone)]
pub struct CandidateStop {
    /// The stop to probe.
    pub stop: StopId,
    /// Earliest departure time the page request should cover.
    pub minimum_departure: DateTime<Utc>,
    /// Desirability; higher is served sooner.
    pub priority: f64,
}

impl PartialEq for CandidateStop {
    fn eq(&self, other: &Self) -> bool {
        self.priority.total_cmp(&other.priority) == Ordering::Equal
    }
}

impl Eq for CandidateStop {}

impl PartialOrd for CandidateStop {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CandidateStop {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority)
    }
}

/// Max-heap of candidate stops, ordered by priority.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    heap: BinaryHeap<CandidateStop>,
}

impl CandidateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a candidate.
    pub fn push(&mut self, candidate: CandidateStop) {
        self.heap.push(candidate);
    }

    /// Remove and return the highest-priority candidate.
    pub fn pop(&mut self) -> Option<CandidateStop> {
        self.heap.pop()
    }

    /// Number of queued candidates.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue holds no candidates.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(id: &str, priority: f64) -> CandidateStop {
        CandidateStop {
            stop: StopId::parse(id).unwrap(),
            minimum_departure: Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
            priority,
        }
    }

    #[test]
    fn pops_highest_priority_first() {
        let mut queue = CandidateQueue::new();
        queue.push(candidate("low", 1.0));
        queue.push(candidate("high", 3.0));
        queue.push(candidate("mid", 2.0));

        assert_eq!(queue.pop().unwrap().stop.as_str(), "high");
        assert_eq!(queue.pop().unwrap().stop.as_str(), "mid");
        assert_eq!(queue.pop().unwrap().stop.as_str(), "low");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn duplicate_stop_ids_coexist() {
        let mut queue = CandidateQueue::new();
        queue.push(candidate("same", 1.0));
        queue.push(candidate("same", 2.0));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().priority, 2.0);
        assert_eq!(queue.pop().unwrap().priority, 1.0);
    }

    #[test]
    fn negative_priorities_order_correctly() {
        let mut queue = CandidateQueue::new();
        queue.push(candidate("worse", -2.0));
        queue.push(candidate("bad", -1.0));

        assert_eq!(queue.pop().unwrap().stop.as_str(), "bad");
        assert_eq!(queue.pop().unwrap().stop.as_str(), "worse");
    }

    #[test]
    fn empty_queue_reports_empty() {
        let mut queue = CandidateQueue::new();
        assert!(queue.is_empty());
        queue.push(candidate("a", 0.5));
        assert!(!queue.is_empty());
        queue.pop();
        assert!(queue.is_empty());
    }
}

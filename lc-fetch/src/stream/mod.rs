//! Connection streams.
//!
//! Two strategies produce the same thing — a pull-based, lazily fetched
//! sequence of [`Connection`](crate::domain::Connection)s:
//! [`ConnectionStream`] follows a feed's own pagination in time order,
//! and [`NeighbourStream`] decides which stop's page to fetch next using
//! a composite heuristic. Either way, no fetch is issued until the
//! consumer asks for more records.

mod connections;
mod heuristic;
mod neighbours;
mod queue;


pub use connections::{ConnectionStream, StreamError};
pub use heuristic::{HeuristicWeights, NormalizationState, SEED_PRIORITY};
pub use neighbours::NeighbourStream;
pub use queue::{CandidateQueue, CandidateStop};

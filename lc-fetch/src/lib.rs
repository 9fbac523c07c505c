//! Data-acquisition layer for a Linked Connections route planner.
//!
//! Turns paginated, hydra-linked connection feeds into lazy, pull-based
//! record streams while deciding, page by page, what to fetch next:
//! either follow the feed's own time order (regular strategy) or probe
//! the most promising stops first (heuristic strategy). All network
//! traffic flows through one concurrency-limited client, so a planner
//! consuming several streams at once never stampedes a feed server.

pub mod domain;
pub mod feed;
pub mod fetch;
pub mod fetcher;
pub mod stream;

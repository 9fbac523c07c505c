//! Bounded HTTP fetching.
//!
//! Everything that touches the network goes through [`BoundedClient`]: it
//! admits at most a fixed number of concurrent requests and queues the
//! rest in submission order, so any number of streams can share one feed
//! server politely. The [`Fetch`] trait is the transport seam; tests swap
//! in [`MockTransport`].

mod client;
mod error;
mod mock;

pub use client::{BoundedClient, ClientConfig, HttpTransport};
pub use error::FetchError;
pub use mock::MockTransport;

use async_trait::async_trait;
use url::Url;

/// A successfully fetched document.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

/// Request lifecycle notification, emitted on a lossy side channel.
///
/// Instrumentation only: correctness of the record streams never depends
/// on anyone listening.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    /// A request was admitted and is now in flight.
    RequestStarted {
        /// The requested URL.
        url: Url,
    },
    /// A request completed, successfully or not.
    ResponseReceived {
        /// The requested URL.
        url: Url,
        /// Whether the request produced a usable response.
        success: bool,
    },
}

/// Transport abstraction for fetching one document by URL.
///
/// Implemented by [`HttpTransport`] for real feeds and by
/// [`MockTransport`] for tests; [`BoundedClient`] wraps either with
/// concurrency admission.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the document at `url`.
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for std::sync::Arc<T> {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        (**self).get(url).await
    }
}

//! Fetch client error types.

use url::Url;

/// Errors from the fetch client.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (connect error, timeout, and friends).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status {
        /// The requested URL.
        url: Url,
        /// The status code the server answered with.
        status: u16,
    },

    /// Transport-level failure outside HTTP (used by non-HTTP transports).
    #[error("transport error: {0}")]
    Transport(String),

    /// The client was shut down while requests were still queued.
    #[error("fetch client closed")]
    Closed,
}

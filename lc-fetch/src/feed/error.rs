//! Feed decode and resolution error types.

use crate::fetch::FetchError;

/// Errors decoding a fetched feed document.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The body is not the JSON shape a page should have.
    #[error("JSON parse error: {message}")]
    Json {
        /// Parser diagnostic.
        message: String,
        /// Leading snippet of the offending body, for log context.
        body: Option<String>,
    },

    /// A record violated a domain invariant.
    #[error("invalid record: {message}")]
    Record {
        /// What was wrong with the record.
        message: String,
    },
}

/// Errors resolving an entry point to a first page URL.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// Fetching the index document failed.
    #[error("index fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The index document could not be decoded.
    #[error("index decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The index exposes no search template covering the requested window.
    #[error("no matching page for the requested time window")]
    NoMatchingPage,

    /// Template expansion did not produce a valid URL.
    #[error("resolved URL is not valid: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DecodeError::Json {
            message: "expected value".into(),
            body: Some("<html>".into()),
        };
        assert!(err.to_string().contains("JSON parse error"));

        let err = ResolutionError::NoMatchingPage;
        assert_eq!(
            err.to_string(),
            "no matching page for the requested time window"
        );
    }
}

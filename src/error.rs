use thiserror::Error;

/// Errors surfaced by facet discovery, request building and dataset
/// decoding.
///
/// Parse and contract failures are kept distinct from network failures so
/// a caller can tell "the site layout changed" apart from "the site is
/// unreachable".
#[derive(Error, Debug)]
pub enum Error {
    /// The page or document does not have the expected structure.
    #[error("parse error: {0}")]
    Parse(String),

    /// The facet list handed to the query builder violates its contract.
    #[error("request contract violation: {0}")]
    Contract(String),

    /// Transport-level failure (timeout, connection, TLS).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-retryable HTTP status, or retries exhausted.
    #[error("request failed with HTTP {0}")]
    Http(reqwest::StatusCode),
}

pub type Result<T> = std::result::Result<T, Error>;

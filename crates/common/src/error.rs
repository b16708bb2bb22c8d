//! Unified error type for the SDK.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller error: rejected before any I/O or cache mutation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any failure of the upstream weather query: bad credential,
    /// unknown city, rate limiting, server errors, network failures,
    /// or a malformed response body. Callers get the detail in the
    /// message but are not expected to branch on it.
    #[error("weather API error: {0}")]
    Api(String),
}

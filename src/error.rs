//! Unified error type.

use thiserror::Error;

/// The error type returned by torii's fallible operations.
///
/// Application-level outcomes (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type covers
/// infrastructure failures (binding a port, accepting a connection) and the
/// two failure classes the middleware layer owns: misconfiguration and
/// accessor misuse. Anything a middleware returns as `Err` travels up the
/// chain untouched until [`Router::handle`](crate::Router::handle) logs it
/// and answers 500.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Missing binding, secret, or environment field. Fatal setup problem,
    /// surfaced on first use and never retried.
    #[error("configuration: {0}")]
    Config(String),

    /// An accessor ran before its middleware. Distinct from an empty but
    /// present value, which is valid application state.
    #[error("a {0} middleware was not set upstream of this call")]
    MiddlewareMissing(&'static str),

    /// Failure inside a session-storage implementation, propagated as-is.
    #[error("session storage: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary storage-implementation error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }
}

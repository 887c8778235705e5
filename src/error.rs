//! Error handling for the omadl library.
//!
//! This module provides the crate-wide [`Error`] enum returned by setup
//! operations such as building an HTTP transport or a request. Failures while
//! a request runs are not errors here: they end the request in
//! [`OrchestrationState::Failed`](crate::orchestrator::OrchestrationState::Failed).
//! Descriptor parsing reports [`ParseError`](crate::descriptor::ParseError)
//! and transports report [`TransportError`](crate::transport::TransportError).

use thiserror::Error;

/// Errors that can happen when using omadl.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// This variant captures internal errors that don't fit into other categories,
    /// typically representing unexpected system-level failures.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error from the underlying URL parser or the expected URL format.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Error from the Reqwest library.
    ///
    /// Raised when an HTTP client cannot be built, e.g. from a bad proxy or TLS setup.
    #[error("Reqwest Error")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
}

/// Result type alias for operations that can fail with an omadl error.
pub type Result<T> = std::result::Result<T, Error>;

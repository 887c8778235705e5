//! Transport module containing the fetch/post collaborator.
//!
//! The orchestrator never talks HTTP directly. It starts transfers through a
//! [`Transport`], consumes the [`TransportEvent`]s of the returned
//! [`TransportSession`], and posts install notifications through the same
//! collaborator.
//!
//! # Overview
//!
//! - [`client`] - HTTP client creation and middleware configuration
//! - [`http`] - The reqwest-backed [`HttpTransport`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use omadl::transport::{FetchRequest, HttpClientConfig, HttpTransport, Transport, TransportEvent};
//! use reqwest::{header::HeaderMap, Url};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(HttpClientConfig::default())?;
//! let mut session = transport.start(FetchRequest {
//!     url: Url::parse("https://example.com/song.dd")?,
//!     headers: HeaderMap::new(),
//!     directory: PathBuf::from("downloads"),
//! });
//!
//! while let Some(event) = session.next_event().await {
//!     if let TransportEvent::Completed { final_path, .. } = event {
//!         println!("Saved to {:?}", final_path);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod http;

pub use client::{create_http_client, HttpClientConfig};
pub use http::HttpTransport;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Url};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Why a transfer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection, request or body failure.
    Network,
    Timeout,
    /// The destination ran out of space.
    NoSpace,
    InvalidUrl,
    /// The server answered with a non-success status.
    Http(u16),
    /// Local file handling failed.
    Io,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Network => write!(f, "network error"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::NoSpace => write!(f, "no space left"),
            TransportErrorKind::InvalidUrl => write!(f, "invalid url"),
            TransportErrorKind::Http(status) => write!(f, "http status {}", status),
            TransportErrorKind::Io => write!(f, "i/o error"),
            TransportErrorKind::Other => write!(f, "transport error"),
        }
    }
}

/// A classified transport failure.
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    /// Create a new [`TransportError`].
    pub fn new(kind: TransportErrorKind, message: impl fmt::Display) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_builder() {
            TransportErrorKind::InvalidUrl
        } else if let Some(status) = err.status() {
            TransportErrorKind::Http(status.as_u16())
        } else if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
            TransportErrorKind::Network
        } else {
            TransportErrorKind::Other
        };
        TransportError::new(kind, err)
    }
}

impl From<reqwest_middleware::Error> for TransportError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            other => TransportError::new(TransportErrorKind::Other, other),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::StorageFull => TransportErrorKind::NoSpace,
            _ => TransportErrorKind::Io,
        };
        TransportError::new(kind, err)
    }
}

/// Everything a transfer reports, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Response headers arrived and the body is being written to `temp_path`.
    Started {
        content_size: Option<u64>,
        content_name: String,
        /// Media type without parameters, lowercase.
        mime_type: Option<String>,
        temp_path: PathBuf,
    },
    /// Total bytes received so far.
    Progress { received_bytes: u64 },
    Paused,
    /// The body is complete and stored at `final_path`.
    Completed { final_path: PathBuf, http_status: u16 },
    Canceled,
    Failed { error_kind: TransportErrorKind },
}

/// What to fetch and where to put it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub directory: PathBuf,
}

/// Steering of an in-flight transfer.
pub trait TransferControl: Send + Sync {
    fn cancel(&self);
    fn pause(&self);
    fn resume(&self);
}

/// One in-flight transfer: its event stream and its controls.
pub struct TransportSession {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    control: Arc<dyn TransferControl>,
}

impl fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSession").finish_non_exhaustive()
    }
}

impl TransportSession {
    /// Create a new [`TransportSession`].
    pub fn new(
        events: mpsc::UnboundedReceiver<TransportEvent>,
        control: Arc<dyn TransferControl>,
    ) -> Self {
        Self { events, control }
    }

    /// Wait for the next event. `None` once the transfer has nothing more to say.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }
}

/// The transfer engine the orchestrator and the notifier depend on.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Begin fetching `request.url` into `request.directory`.
    fn start(&self, request: FetchRequest) -> TransportSession;

    /// POST a plain text `body` and return the HTTP status code.
    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<u16, TransportError>;
}

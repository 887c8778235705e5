//! Omadl is a crate handling OMA Download on the consumer side: fetching a
//! download descriptor, asking the user, fetching the described content and
//! reporting the outcome to the content provider.
//!
//! Plain content downloads run through the same state machine and skip the
//! descriptor and notification steps.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use omadl::{DownloadRequest, HttpClientConfig, HttpTransport, OrchestratorBuilder, Error};
//! use std::{path::PathBuf, sync::Arc};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let transport = Arc::new(HttpTransport::new(HttpClientConfig::default())?);
//! let orchestrator = OrchestratorBuilder::new()
//!     .directory(PathBuf::from("output"))
//!     .build(transport);
//!
//! let mut handle = orchestrator.submit(DownloadRequest::try_from("https://example.com/ringtone.dd")?);
//! let snapshot = handle.wait().await;
//! println!("{} ended as {}", snapshot.id, snapshot.state);
//! handle.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`collab`] - Confirmation and history collaborators
//! - [`descriptor`] - The download descriptor and its parser
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`notify`] - Install status notifications
//! - [`orchestrator`] - The per-request state machine, `Orchestrator` and `OrchestratorBuilder`
//! - [`progress`] - Progress bar styling and display management
//! - [`transport`] - The fetch/post collaborator and its HTTP implementation
//! - [`utils`] - Shared utility functions

pub mod collab;
pub mod descriptor;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod progress;
pub mod transport;
pub mod utils;

pub use collab::{AutoConfirm, ConfirmResponse, Confirmation, HistoryId, HistoryRecord, Persistence};
pub use descriptor::{parse_document, Descriptor, ParseError, ParseSession};
pub use error::{Error, Result};
pub use notify::{InstallStatus, NotificationJob, NotificationSender};
pub use orchestrator::{
    DownloadHandle, DownloadRequest, FailureKind, OrchestrationState, Orchestrator,
    OrchestratorBuilder, Snapshot,
};
pub use progress::{ProgressBarOpts, StyleOptions};
pub use transport::{HttpClientConfig, HttpTransport, Transport, TransportEvent};

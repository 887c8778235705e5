//! Orchestrator module containing the per-request download state machine.
//!
//! This module provides the [`Orchestrator`] and its builder. Each submitted
//! request is driven from `Requesting` to one of `Finished`, `Failed` or
//! `Canceled`, branching on whether the fetched resource is an OMA download
//! descriptor or plain content.
//!
//! # Overview
//!
//! - `orchestrator` - The `Orchestrator` and the `DownloadHandle` of a submitted request
//! - `builder` - OrchestratorBuilder for configuration and collaborators
//! - `config` - Configuration structures and callback types
//! - `request` - What to fetch and where to store it
//! - `state` - States, failure kinds and snapshots
//!
//! # Examples
//!
//! ```rust,no_run
//! use omadl::collab::MemoryHistory;
//! use omadl::orchestrator::{DownloadRequest, OrchestratorBuilder};
//! use omadl::transport::{HttpClientConfig, HttpTransport};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::new(HttpClientConfig::default())?);
//! let orchestrator = OrchestratorBuilder::new()
//!     .persistence(Arc::new(MemoryHistory::new()))
//!     .on_state_change(|snapshot| println!("{} is {}", snapshot.id, snapshot.state))
//!     .build(transport);
//!
//! let mut handle = orchestrator.submit(DownloadRequest::try_from("https://example.com/game.dd")?);
//! println!("{:?}", handle.wait().await);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
mod context;
pub mod orchestrator;
pub mod request;
pub mod state;

pub use builder::OrchestratorBuilder;
pub use config::{OrchestratorConfig, StateCallback};
pub use orchestrator::{DownloadHandle, Orchestrator};
pub use request::DownloadRequest;
pub use state::{FailureKind, OrchestrationState, Snapshot};

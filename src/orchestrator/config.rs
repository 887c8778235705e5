//! Configuration structures and defaults for the orchestrator.
//!
//! # Examples
//!
//! ## Observing State Changes
//!
//! ```rust
//! use omadl::orchestrator::{OrchestrationState, StateCallback};
//!
//! let callback: StateCallback = Box::new(|snapshot| {
//!     if let OrchestrationState::Failed(kind) = snapshot.state {
//!         println!("{} failed: {:?}", snapshot.id, kind);
//!     }
//! });
//! ```

use super::state::Snapshot;
use crate::notify::NotifyConfig;
use crate::progress::StyleOptions;

use reqwest::header::HeaderMap;
use std::env::current_dir;
use std::path::PathBuf;
use std::sync::Arc;

/// Callback type for state change events.
pub type StateCallback = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// Configuration structure for the orchestrator.
#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Default install directory.
    pub directory: PathBuf,
    /// Headers added to every fetch.
    pub headers: Option<HeaderMap>,
    /// Progress bar style options.
    pub style_options: StyleOptions,
    /// Install notification delivery.
    pub notify: NotifyConfig,
    /// Callback for every state transition.
    pub on_state_change: Option<Arc<StateCallback>>,
}

impl std::fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("directory", &self.directory)
            .field("headers", &self.headers)
            .field("style_options", &self.style_options)
            .field("notify", &self.notify)
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            directory: current_dir().unwrap_or_default(),
            headers: None,
            style_options: StyleOptions::default(),
            notify: NotifyConfig::default(),
            on_state_change: None,
        }
    }
}

//! Builder pattern implementation for creating Orchestrator instances.
//!
//! # Examples
//!
//! ```rust
//! use omadl::collab::{AutoConfirm, MemoryHistory};
//! use omadl::orchestrator::OrchestratorBuilder;
//! use omadl::transport::{HttpClientConfig, HttpTransport};
//! use std::{path::PathBuf, sync::Arc, time::Duration};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::new(HttpClientConfig::default())?);
//!
//! let orchestrator = OrchestratorBuilder::hidden()
//!     .directory(PathBuf::from("./downloads"))
//!     .notify_attempts(3)
//!     .notify_retry_delay(Duration::from_secs(5))
//!     .confirmation(Arc::new(AutoConfirm::accept()))
//!     .persistence(Arc::new(MemoryHistory::new()))
//!     .build(transport);
//! # Ok(())
//! # }
//! ```

use super::config::OrchestratorConfig;
use super::orchestrator::Orchestrator;
use super::state::Snapshot;
use crate::collab::{AutoConfirm, Confirmation, NoHistory, Persistence};
use crate::progress::StyleOptions;
use crate::transport::Transport;

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::{path::PathBuf, sync::Arc, time::Duration};

/// A builder used to create an [`Orchestrator`].
///
/// Without explicit collaborators, every confirmation is accepted and no
/// history is kept.
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    confirmation: Option<Arc<dyn Confirmation>>,
    persistence: Option<Arc<dyn Persistence>>,
}

impl OrchestratorBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        OrchestratorBuilder::default()
    }

    /// Convenience function to hide the progress bars.
    pub fn hidden() -> Self {
        let mut builder = OrchestratorBuilder::default();
        builder.config.style_options = StyleOptions::hidden();
        builder
    }

    /// Sets the default install directory.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.directory = directory;
        self
    }

    /// Set the progress bar style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Set the total number of attempts per install notification.
    pub fn notify_attempts(mut self, attempts: u32) -> Self {
        self.config.notify.max_attempts = attempts;
        self
    }

    /// Set the pause between two install notification attempts.
    pub fn notify_retry_delay(mut self, delay: Duration) -> Self {
        self.config.notify.retry_delay = delay;
        self
    }

    /// Set how long one install notification POST may take.
    pub fn notify_timeout(mut self, timeout: Duration) -> Self {
        self.config.notify.attempt_timeout = timeout;
        self
    }

    /// Set the User-Agent sent with install notifications.
    pub fn user_agent(mut self, user_agent: HeaderValue) -> Self {
        self.config.notify.user_agent = Some(user_agent);
        self
    }

    /// Set the user confirmation collaborator.
    pub fn confirmation(mut self, confirmation: Arc<dyn Confirmation>) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    /// Set the history collaborator.
    pub fn persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Set callback for every state transition.
    ///
    /// The callback runs on the request's own task, in transition order.
    pub fn on_state_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.config.on_state_change = Some(Arc::new(Box::new(callback)));
        self
    }

    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add headers sent with every fetch.
    ///
    /// Calling `.headers()` multiple times merges all maps into one.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Add a header sent with every fetch.
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Create the [`Orchestrator`] on top of `transport`.
    pub fn build(self, transport: Arc<dyn Transport>) -> Orchestrator {
        let confirmation = self
            .confirmation
            .unwrap_or_else(|| Arc::new(AutoConfirm::accept()));
        let persistence = self.persistence.unwrap_or_else(|| Arc::new(NoHistory));
        Orchestrator::new(self.config, transport, confirmation, persistence)
    }
}

//! The orchestrator and the handles of submitted requests.
//!
//! Every submitted request runs on its own tokio task. Events for one
//! request are handled strictly in order by that task; distinct requests
//! progress independently.
//!
//! # Examples
//!
//! ```rust,no_run
//! use omadl::orchestrator::{DownloadRequest, OrchestrationState, OrchestratorBuilder};
//! use omadl::transport::{HttpClientConfig, HttpTransport};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::new(HttpClientConfig::default())?);
//! let orchestrator = OrchestratorBuilder::new().build(transport);
//!
//! let mut handle = orchestrator.submit(DownloadRequest::try_from("https://example.com/song.dd")?);
//! let snapshot = handle.wait().await;
//! if snapshot.state == OrchestrationState::Finished {
//!     println!("Installed {:?}", snapshot.content_name);
//! }
//! handle.close().await;
//! # Ok(())
//! # }
//! ```

use super::config::OrchestratorConfig;
use super::context::OrchestrationContext;
use super::request::DownloadRequest;
use super::state::{OrchestrationState, Snapshot};
use crate::collab::{Confirmation, HistoryId, Persistence};
use crate::notify::NotificationSender;
use crate::progress::ProgressDisplay;
use crate::transport::Transport;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Requests a caller can make of a running context.
#[derive(Debug)]
pub(crate) enum Command {
    Cancel,
    Pause,
    Resume,
    Retry(Option<DownloadRequest>),
    Remove,
    Close,
}

/// Collaborators shared by every context of one orchestrator.
pub(crate) struct Shared {
    pub(crate) config: OrchestratorConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) confirmation: Arc<dyn Confirmation>,
    pub(crate) persistence: Arc<dyn Persistence>,
    pub(crate) notifier: NotificationSender,
    pub(crate) progress: ProgressDisplay,
}

/// Drives OMA and plain download requests.
///
/// An orchestrator can be created via its builder:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use omadl::orchestrator::OrchestratorBuilder;
/// use omadl::transport::{HttpClientConfig, HttpTransport};
/// use std::sync::Arc;
///
/// let transport = Arc::new(HttpTransport::new(HttpClientConfig::default())?);
/// let orchestrator = OrchestratorBuilder::hidden().build(transport);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.shared.config)
            .finish()
    }
}

impl Orchestrator {
    pub(crate) fn new(
        config: OrchestratorConfig,
        transport: Arc<dyn Transport>,
        confirmation: Arc<dyn Confirmation>,
        persistence: Arc<dyn Persistence>,
    ) -> Self {
        let notifier = NotificationSender::new(transport.clone(), config.notify.clone());
        let progress = ProgressDisplay::new(config.style_options.clone());
        Self {
            shared: Arc::new(Shared {
                config,
                transport,
                confirmation,
                persistence,
                notifier,
                progress,
            }),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Gets the orchestrator configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    /// Submit a request. Must be called from within a tokio runtime.
    pub fn submit(&self, request: DownloadRequest) -> DownloadHandle {
        let id = HistoryId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::new(id));

        debug!("Submitting {} for {}", id, request.url);
        let context =
            OrchestrationContext::new(id, request, self.shared.clone(), commands_rx, snapshot_tx);
        let task = tokio::spawn(context.run());

        DownloadHandle {
            id,
            commands: commands_tx,
            snapshot: snapshot_rx,
            expected_attempt: 1,
            task,
        }
    }
}

/// Controls one submitted request.
///
/// Dropping every handle of an active request cancels it.
pub struct DownloadHandle {
    id: HistoryId,
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<Snapshot>,
    expected_attempt: u32,
    task: JoinHandle<()>,
}

impl fmt::Debug for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadHandle")
            .field("id", &self.id)
            .field("snapshot", &*self.snapshot.borrow())
            .finish()
    }
}

impl DownloadHandle {
    pub fn id(&self) -> HistoryId {
        self.id
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> OrchestrationState {
        self.snapshot.borrow().state
    }

    /// Cancel the request. A no-op on a terminal request, observers still hear about it.
    pub fn cancel(&self) {
        self.send(Command::Cancel);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    /// Re-enter `Requesting` from `Failed` or `Canceled`.
    ///
    /// `request` replaces the original parameters when given. Ignored while
    /// the request is still active.
    pub fn retry(&mut self, request: Option<DownloadRequest>) {
        if self.state().is_retryable() {
            self.expected_attempt = self.snapshot.borrow().attempt + 1;
            self.send(Command::Retry(request));
        } else {
            debug!("Ignoring retry of {} in state {}", self.id, self.state());
        }
    }

    /// Wait for a terminal state with no notification outstanding.
    pub async fn wait(&mut self) -> Snapshot {
        let expected = self.expected_attempt;
        let settled = self
            .snapshot
            .wait_for(|s| s.attempt >= expected && s.state.is_terminal() && s.settled)
            .await
            .map(|s| s.clone());
        settled.unwrap_or_else(|_| self.snapshot.borrow().clone())
    }

    /// Cancel if active, delete the history record and tear down.
    pub async fn remove(self) {
        self.send(Command::Remove);
        let _ = self.task.await;
    }

    /// Tear down once any notification has finished.
    pub async fn close(self) {
        self.send(Command::Close);
        let _ = self.task.await;
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("{} is already torn down", self.id);
        }
    }
}

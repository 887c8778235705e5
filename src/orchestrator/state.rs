//! Orchestration states, failure kinds and the snapshot observers see.

use crate::collab::HistoryId;
use crate::notify::InstallStatus;
use crate::transport::TransportErrorKind;

use std::fmt;

/// Why a request ended in [`OrchestrationState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The descriptor was invalid, unsupported, or the content did not match it.
    ParsingFail,
    NetworkFail,
    InvalidUrl,
    NotEnoughMemory,
    EngineFail,
}

impl FailureKind {
    /// The install status reported for a transfer failure on the OMA path.
    pub fn install_status(self) -> InstallStatus {
        match self {
            FailureKind::ParsingFail => InstallStatus::InvalidDescriptor,
            FailureKind::NetworkFail | FailureKind::InvalidUrl => InstallStatus::LoaderError,
            FailureKind::NotEnoughMemory => InstallStatus::InsufficientMemory,
            FailureKind::EngineFail => InstallStatus::DeviceAborted,
        }
    }
}

impl From<TransportErrorKind> for FailureKind {
    fn from(kind: TransportErrorKind) -> Self {
        match kind {
            TransportErrorKind::Network
            | TransportErrorKind::Timeout
            | TransportErrorKind::Http(_) => FailureKind::NetworkFail,
            TransportErrorKind::InvalidUrl => FailureKind::InvalidUrl,
            TransportErrorKind::NoSpace => FailureKind::NotEnoughMemory,
            TransportErrorKind::Io | TransportErrorKind::Other => FailureKind::EngineFail,
        }
    }
}

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrchestrationState {
    Idle,
    Requesting,
    ReceivingDescriptor,
    ValidatingDescriptor,
    AwaitingUserConfirm,
    DownloadingContent,
    ValidatingContent,
    Finished,
    Failed(FailureKind),
    Canceled,
}

impl OrchestrationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrchestrationState::Finished
                | OrchestrationState::Failed(_)
                | OrchestrationState::Canceled
        )
    }

    /// Whether an explicit retry is allowed from this state.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            OrchestrationState::Failed(_) | OrchestrationState::Canceled
        )
    }
}

impl fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationState::Idle => write!(f, "idle"),
            OrchestrationState::Requesting => write!(f, "requesting"),
            OrchestrationState::ReceivingDescriptor => write!(f, "receiving descriptor"),
            OrchestrationState::ValidatingDescriptor => write!(f, "validating descriptor"),
            OrchestrationState::AwaitingUserConfirm => write!(f, "awaiting user confirm"),
            OrchestrationState::DownloadingContent => write!(f, "downloading content"),
            OrchestrationState::ValidatingContent => write!(f, "validating content"),
            OrchestrationState::Finished => write!(f, "finished"),
            OrchestrationState::Failed(kind) => write!(f, "failed ({:?})", kind),
            OrchestrationState::Canceled => write!(f, "canceled"),
        }
    }
}

/// Observable view of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: HistoryId,
    pub state: OrchestrationState,
    /// Incremented on every (re)submission.
    pub attempt: u32,
    pub content_name: Option<String>,
    pub content_size: Option<u64>,
    pub received_bytes: u64,
    /// The descriptor's `nextURL`, once known.
    pub next_uri: Option<String>,
    /// True once the state is terminal and no notification is outstanding.
    pub settled: bool,
}

impl Snapshot {
    pub(crate) fn new(id: HistoryId) -> Self {
        Self {
            id,
            state: OrchestrationState::Idle,
            attempt: 0,
            content_name: None,
            content_size: None,
            received_bytes: 0,
            next_uri: None,
            settled: false,
        }
    }
}

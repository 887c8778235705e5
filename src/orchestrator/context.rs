//! The per-request state machine.
//!
//! An [`OrchestrationContext`] owns everything about one request and runs on
//! its own task. It leaves `run` only once the request is terminal, any
//! install notification has finished, and its handles let go.

use super::orchestrator::{Command, Shared};
use super::request::DownloadRequest;
use super::state::{FailureKind, OrchestrationState, Snapshot};
use crate::collab::{ConfirmResponse, HistoryId, HistoryRecord};
use crate::descriptor::{feed_document, is_drm_exempt, Descriptor, ParseSession, DESCRIPTOR_MIME};
use crate::notify::{InstallStatus, NotificationJob};
use crate::transport::{FetchRequest, TransportEvent, TransportSession};

use indicatif::ProgressBar;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// How a pass through the state machine ended.
enum Flow {
    /// Terminal state reached, handles still attached.
    Terminal,
    Retry(Option<DownloadRequest>),
    Remove,
    Close,
}

/// What a command means while work is in flight.
enum Interrupt {
    Stop(Flow),
    Pause,
    Resume,
    Ignore,
}

fn interrupt(command: Option<Command>) -> Interrupt {
    match command {
        Some(Command::Cancel) => Interrupt::Stop(Flow::Terminal),
        Some(Command::Remove) => Interrupt::Stop(Flow::Remove),
        // Every handle is gone.
        Some(Command::Close) | None => Interrupt::Stop(Flow::Close),
        Some(Command::Pause) => Interrupt::Pause,
        Some(Command::Resume) => Interrupt::Resume,
        Some(Command::Retry(_)) => Interrupt::Ignore,
    }
}

fn is_descriptor(mime_type: Option<&str>) -> bool {
    mime_type.is_some_and(|mime| mime.eq_ignore_ascii_case(DESCRIPTOR_MIME))
}

/// Which fetch a transport session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// The submitted URL: either a descriptor or plain content.
    Initial,
    /// The descriptor's object URI.
    Content,
}

pub(crate) struct OrchestrationContext {
    id: HistoryId,
    request: DownloadRequest,
    /// Present from a successful parse until the request is terminal.
    descriptor: Option<Descriptor>,
    state: OrchestrationState,
    notification: Option<NotificationJob>,
    record: HistoryRecord,
    /// The record changed since it was last written.
    record_dirty: bool,
    transfer_bar: Option<ProgressBar>,
    shared: Arc<Shared>,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshot: watch::Sender<Snapshot>,
}

impl OrchestrationContext {
    pub(crate) fn new(
        id: HistoryId,
        request: DownloadRequest,
        shared: Arc<Shared>,
        commands: mpsc::UnboundedReceiver<Command>,
        snapshot: watch::Sender<Snapshot>,
    ) -> Self {
        let record = HistoryRecord::new(request.url.clone());
        Self {
            id,
            request,
            descriptor: None,
            state: OrchestrationState::Idle,
            notification: None,
            record,
            record_dirty: false,
            transfer_bar: None,
            shared,
            commands,
            snapshot,
        }
    }

    pub(crate) async fn run(mut self) {
        self.shared.persistence.create_record(self.id, &self.record);
        self.shared.progress.add_request();

        loop {
            let flow = self.drive().await;
            self.settle().await;

            let flow = match flow {
                Flow::Terminal => self.idle().await,
                other => other,
            };
            match flow {
                Flow::Retry(request) => self.reset(request),
                Flow::Remove => {
                    debug!("Removing {}", self.id);
                    self.shared.persistence.delete_record(self.id);
                    return;
                }
                Flow::Terminal | Flow::Close => {
                    debug!("Tearing down {}", self.id);
                    return;
                }
            }
        }
    }

    /// One pass from `Requesting` to a terminal state.
    async fn drive(&mut self) -> Flow {
        // Waiters match on the attempt, so it must never pair with the
        // previous outcome.
        self.snapshot.send_modify(|s| {
            s.attempt += 1;
            s.state = OrchestrationState::Requesting;
            s.settled = false;
        });
        self.transition(OrchestrationState::Requesting);

        let session = self.start_fetch(self.request.url.clone());
        let final_path = match self.follow(session, Phase::Initial).await {
            Ok(path) => path,
            Err(flow) => return flow,
        };

        // Plain content: no descriptor, no notification.
        if self.state != OrchestrationState::ReceivingDescriptor {
            self.finalize(final_path);
            return Flow::Terminal;
        }

        if !self.validate_descriptor(&final_path).await {
            return Flow::Terminal;
        }
        if let Err(flow) = self.confirm().await {
            return flow;
        }

        let Some(object_url) = self.object_url() else {
            self.fail(FailureKind::InvalidUrl);
            return Flow::Terminal;
        };
        self.transition(OrchestrationState::DownloadingContent);

        let session = self.start_fetch(object_url);
        match self.follow(session, Phase::Content).await {
            Ok(path) => self.finalize(path),
            Err(flow) => return flow,
        }
        Flow::Terminal
    }

    fn start_fetch(&self, url: Url) -> TransportSession {
        let mut headers = self.shared.config.headers.clone().unwrap_or_default();
        headers.extend(self.request.headers.clone());
        let directory = self
            .request
            .directory
            .clone()
            .unwrap_or_else(|| self.shared.config.directory.clone());

        debug!("{} fetching {}", self.id, url);
        self.shared.transport.start(FetchRequest {
            url,
            headers,
            directory,
        })
    }

    /// Consume transport events until the transfer completes.
    async fn follow(
        &mut self,
        mut session: TransportSession,
        phase: Phase,
    ) -> Result<PathBuf, Flow> {
        loop {
            tokio::select! {
                command = self.commands.recv() => match interrupt(command) {
                    Interrupt::Stop(flow) => {
                        session.cancel();
                        self.cancel();
                        return Err(flow);
                    }
                    Interrupt::Pause => session.pause(),
                    Interrupt::Resume => session.resume(),
                    Interrupt::Ignore => debug!("{} is active, ignoring retry", self.id),
                },
                event = session.next_event() => {
                    let Some(event) = event else {
                        warn!("{} transfer ended without an outcome", self.id);
                        self.fail(FailureKind::EngineFail);
                        return Err(Flow::Terminal);
                    };
                    match event {
                        TransportEvent::Started {
                            content_size,
                            content_name,
                            mime_type,
                            ..
                        } => {
                            if !self.on_started(phase, content_size, content_name, mime_type) {
                                session.cancel();
                                self.fail_with(
                                    FailureKind::ParsingFail,
                                    InstallStatus::AttributeMismatch,
                                );
                                return Err(Flow::Terminal);
                            }
                        }
                        TransportEvent::Progress { received_bytes } => {
                            self.on_progress(received_bytes)
                        }
                        TransportEvent::Paused => debug!("{} paused", self.id),
                        TransportEvent::Completed {
                            final_path,
                            http_status,
                        } => {
                            debug!("{} completed with status {}", self.id, http_status);
                            return Ok(final_path);
                        }
                        TransportEvent::Canceled => {
                            self.cancel();
                            return Err(Flow::Terminal);
                        }
                        TransportEvent::Failed { error_kind } => {
                            warn!("{} transfer failed: {}", self.id, error_kind);
                            self.fail(error_kind.into());
                            return Err(Flow::Terminal);
                        }
                    }
                }
            }
        }
    }

    /// Route a `Started` event. Returns false when the content type is refused.
    fn on_started(
        &mut self,
        phase: Phase,
        content_size: Option<u64>,
        content_name: String,
        mime_type: Option<String>,
    ) -> bool {
        match phase {
            Phase::Initial if is_descriptor(mime_type.as_deref()) => {
                self.transition(OrchestrationState::ReceivingDescriptor);
            }
            Phase::Initial => {
                self.begin_content(content_size, content_name, mime_type);
                self.transition(OrchestrationState::DownloadingContent);
            }
            Phase::Content => {
                if let Some(ref mime) = mime_type {
                    if !self.accepts(mime) {
                        warn!("{} refusing content of type {}", self.id, mime);
                        return false;
                    }
                }
                let size = content_size.or(self.descriptor.as_ref().map(|d| d.size_bytes));
                self.begin_content(size, content_name, mime_type);
                self.flush_record();
            }
        }
        true
    }

    fn accepts(&self, mime: &str) -> bool {
        match self.descriptor {
            Some(ref descriptor) => descriptor.accepts_type(mime) || is_drm_exempt(mime),
            None => true,
        }
    }

    fn begin_content(
        &mut self,
        content_size: Option<u64>,
        content_name: String,
        mime_type: Option<String>,
    ) {
        self.transfer_bar = Some(
            self.shared
                .progress
                .create_transfer(&content_name, content_size),
        );
        self.snapshot.send_modify(|s| {
            s.content_name = Some(content_name.clone());
            s.content_size = content_size;
            s.received_bytes = 0;
        });
        self.record.content_name = Some(content_name);
        self.record.content_size = content_size;
        self.record.mime_type = mime_type;
        self.record_dirty = true;
    }

    fn on_progress(&mut self, received_bytes: u64) {
        if let Some(ref pb) = self.transfer_bar {
            pb.set_position(received_bytes);
        }
        self.snapshot.send_modify(|s| s.received_bytes = received_bytes);
    }

    /// Parse the fetched descriptor. Returns true when it may be confirmed.
    async fn validate_descriptor(&mut self, path: &Path) -> bool {
        self.transition(OrchestrationState::ValidatingDescriptor);

        let read = fs::read(path).await;
        if let Err(e) = fs::remove_file(path).await {
            warn!("{} could not delete descriptor {:?}: {}", self.id, path, e);
        }
        let bytes = match read {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{} could not read descriptor {:?}: {}", self.id, path, e);
                self.fail(FailureKind::EngineFail);
                return false;
            }
        };

        let mut session = ParseSession::new();
        feed_document(&bytes, &mut session);
        let notify_uri = session.install_notify_uri().map(str::to_owned);

        match session.finish() {
            Err(e) => {
                warn!("{} rejected descriptor: {}", self.id, e);
                self.reject(notify_uri, InstallStatus::InvalidDescriptor);
                false
            }
            Ok(descriptor) if !descriptor.is_version_supported() => {
                warn!(
                    "{} rejected descriptor version {}",
                    self.id,
                    descriptor.version()
                );
                self.reject(descriptor.install_notify_uri, InstallStatus::InvalidDdVersion);
                false
            }
            Ok(descriptor) => {
                let next_uri = descriptor.next_uri.clone();
                self.snapshot.send_modify(|s| s.next_uri = next_uri);
                self.descriptor = Some(descriptor);
                true
            }
        }
    }

    /// Ask the user. `Err` carries how the pass ended when not accepted.
    async fn confirm(&mut self) -> Result<(), Flow> {
        let Some(summary) = self.descriptor.as_ref().map(Descriptor::summary) else {
            self.fail(FailureKind::EngineFail);
            return Err(Flow::Terminal);
        };
        self.transition(OrchestrationState::AwaitingUserConfirm);

        let confirmation = self.shared.confirmation.clone();
        let mut response = confirmation.present_confirmation(&summary);
        loop {
            tokio::select! {
                answer = &mut response => {
                    return match answer {
                        ConfirmResponse::Accepted => Ok(()),
                        ConfirmResponse::Declined => {
                            info!("{} declined by the user", self.id);
                            self.cancel();
                            Err(Flow::Terminal)
                        }
                    };
                }
                command = self.commands.recv() => match interrupt(command) {
                    Interrupt::Stop(flow) => {
                        self.cancel();
                        return Err(flow);
                    }
                    Interrupt::Pause | Interrupt::Resume | Interrupt::Ignore => {}
                },
            }
        }
    }

    /// The object URI, resolved against the descriptor's URL.
    fn object_url(&self) -> Option<Url> {
        let object_uri = &self.descriptor.as_ref()?.object_uri;
        match self.request.url.join(object_uri) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("{} invalid object URI {:?}: {}", self.id, object_uri, e);
                None
            }
        }
    }

    fn finalize(&mut self, final_path: PathBuf) {
        self.transition(OrchestrationState::ValidatingContent);

        debug!("{} registering {:?}", self.id, final_path);
        self.record.path = Some(final_path);
        self.record_dirty = true;

        let target = self.notify_target();
        self.notify(target, InstallStatus::Success);
        self.end(OrchestrationState::Finished);
    }

    fn fail(&mut self, kind: FailureKind) {
        self.fail_with(kind, kind.install_status());
    }

    fn fail_with(&mut self, kind: FailureKind, status: InstallStatus) {
        let target = self.notify_target();
        self.notify(target, status);
        self.end(OrchestrationState::Failed(kind));
    }

    /// Fail on a descriptor that never made it into the context.
    fn reject(&mut self, target: Option<String>, status: InstallStatus) {
        self.notify(target, status);
        self.end(OrchestrationState::Failed(FailureKind::ParsingFail));
    }

    fn cancel(&mut self) {
        let target = self.notify_target();
        self.notify(target, InstallStatus::UserCancelled);
        self.end(OrchestrationState::Canceled);
    }

    /// Where to report to. Only set on the OMA path once a descriptor is accepted.
    fn notify_target(&self) -> Option<String> {
        self.descriptor
            .as_ref()
            .and_then(|d| d.install_notify_uri.clone())
    }

    fn notify(&mut self, target: Option<String>, status: InstallStatus) {
        let Some(target) = target else {
            return;
        };
        debug!("{} reporting \"{}\" to {}", self.id, status, target);
        if let Some(previous) = self.notification.take() {
            previous.cancel();
        }
        self.notification = Some(self.shared.notifier.send(&target, status.code()));
    }

    fn end(&mut self, state: OrchestrationState) {
        if let Some(pb) = self.transfer_bar.take() {
            self.shared.progress.finish_transfer(pb);
        }
        self.shared.progress.complete_request();
        self.descriptor = None;
        self.transition(state);
    }

    /// Enter `state`: one history write, then observers.
    fn transition(&mut self, state: OrchestrationState) {
        debug!(id = %self.id, "{} -> {}", self.state, state);
        self.state = state;
        self.record.state = state;
        if self.record_dirty {
            self.flush_record();
        } else {
            self.shared.persistence.update_state(self.id, state);
        }
        self.snapshot.send_modify(|s| {
            s.state = state;
            s.settled = false;
        });
        self.notify_observers();
    }

    fn flush_record(&mut self) {
        self.record_dirty = false;
        self.shared.persistence.update_record(self.id, &self.record);
    }

    fn notify_observers(&self) {
        if let Some(ref callback) = self.shared.config.on_state_change {
            let snapshot = self.snapshot.borrow().clone();
            callback(&snapshot);
        }
    }

    /// Wait for the outstanding notification, then publish the outcome as settled.
    async fn settle(&mut self) {
        if let Some(job) = self.notification.take() {
            job.wait_finished().await;
            debug!(
                "{} notification finished after {} attempt(s)",
                self.id,
                job.attempts()
            );
        }
        self.snapshot.send_modify(|s| s.settled = true);
    }

    /// Terminal and settled: wait for the caller.
    async fn idle(&mut self) -> Flow {
        loop {
            match self.commands.recv().await {
                None | Some(Command::Close) => return Flow::Close,
                Some(Command::Remove) => return Flow::Remove,
                Some(Command::Retry(request)) if self.state.is_retryable() => {
                    return Flow::Retry(request)
                }
                Some(Command::Retry(_)) => {
                    debug!("{} is {}, ignoring retry", self.id, self.state)
                }
                Some(Command::Cancel) => {
                    debug!("{} is already {}", self.id, self.state);
                    self.notify_observers();
                }
                Some(Command::Pause) | Some(Command::Resume) => {}
            }
        }
    }

    /// Clear transient fields before re-entering `Requesting`.
    fn reset(&mut self, request: Option<DownloadRequest>) {
        if let Some(request) = request {
            self.request = request;
        }
        self.descriptor = None;
        self.notification = None;
        self.record = HistoryRecord::new(self.request.url.clone());
        self.record_dirty = true;
        self.snapshot.send_modify(|s| {
            s.content_name = None;
            s.content_size = None;
            s.received_bytes = 0;
            s.next_uri = None;
        });
        self.shared.progress.add_request();
        debug!("{} retrying {}", self.id, self.request.url);
    }
}

//! One-shot install notifications with bounded retries.
//!
//! [`NotificationSender::send`] spawns a delivery task and hands back a
//! [`NotificationJob`]. The job is the only synchronization point: it reports
//! `finished` once the server accepted the report, the attempt ceiling was
//! reached, or the job was canceled. A POST that outlives
//! [`NotifyConfig::attempt_timeout`] counts as a failed attempt.

use super::status::notification_body;
use crate::transport::Transport;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

/// Configuration of install notification delivery.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Total number of POST attempts per notification.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub retry_delay: Duration,
    /// How long one POST may take before it counts as a failed attempt.
    pub attempt_timeout: Duration,
    /// Optional User-Agent header sent with every notification.
    pub user_agent: Option<HeaderValue>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

struct JobInner {
    target_uri: String,
    status_code: u16,
    attempts: AtomicU32,
    finished: watch::Sender<bool>,
    abort: Mutex<Option<AbortHandle>>,
}

/// Handle to one notification delivery.
#[derive(Clone)]
pub struct NotificationJob {
    inner: Arc<JobInner>,
}

impl fmt::Debug for NotificationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationJob")
            .field("target_uri", &self.inner.target_uri)
            .field("status_code", &self.inner.status_code)
            .field("attempts", &self.attempts())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl NotificationJob {
    fn new(target_uri: &str, status_code: u16) -> Self {
        let (finished, _) = watch::channel(false);
        Self {
            inner: Arc::new(JobInner {
                target_uri: target_uri.to_string(),
                status_code,
                attempts: AtomicU32::new(0),
                finished,
                abort: Mutex::new(None),
            }),
        }
    }

    pub fn target_uri(&self) -> &str {
        &self.inner.target_uri
    }

    pub fn status_code(&self) -> u16 {
        self.inner.status_code
    }

    /// Number of POST attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        *self.inner.finished.borrow()
    }

    /// Resolve once the job is finished, whatever the outcome.
    pub async fn wait_finished(&self) {
        let mut finished = self.inner.finished.subscribe();
        // The sender lives in `inner`, so the channel cannot close here.
        let _ = finished.wait_for(|done| *done).await;
    }

    /// Stop delivering and release the delivery task.
    pub fn cancel(&self) {
        if let Some(handle) = self.take_abort_handle() {
            handle.abort();
        }
        if !self.is_finished() {
            debug!("Install notification to {} canceled", self.target_uri());
        }
        self.mark_finished();
    }

    fn mark_finished(&self) {
        self.inner.finished.send_replace(true);
    }

    fn set_abort_handle(&self, handle: AbortHandle) {
        if let Ok(mut slot) = self.inner.abort.lock() {
            *slot = Some(handle);
        }
    }

    fn take_abort_handle(&self) -> Option<AbortHandle> {
        self.inner.abort.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Sends install status reports through a [`Transport`].
#[derive(Clone)]
pub struct NotificationSender {
    transport: Arc<dyn Transport>,
    config: NotifyConfig,
}

impl fmt::Debug for NotificationSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationSender")
            .field("config", &self.config)
            .finish()
    }
}

impl NotificationSender {
    /// Create a new [`NotificationSender`].
    pub fn new(transport: Arc<dyn Transport>, config: NotifyConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Report `status_code` to `target_uri` in the background.
    ///
    /// Must be called from within a tokio runtime. Unrecognized codes are not
    /// sent; the returned job is already finished.
    pub fn send(&self, target_uri: &str, status_code: u16) -> NotificationJob {
        let job = NotificationJob::new(target_uri, status_code);

        let body = notification_body(status_code);
        if body.is_empty() {
            warn!("Not sending unknown install status {} to {}", status_code, target_uri);
            job.mark_finished();
            return job;
        }

        let mut headers = HeaderMap::new();
        if let Some(ref user_agent) = self.config.user_agent {
            headers.insert(USER_AGENT, user_agent.clone());
        }

        let handle = tokio::spawn(deliver(
            self.transport.clone(),
            job.clone(),
            headers,
            body,
            self.config.clone(),
        ));
        job.set_abort_handle(handle.abort_handle());
        job
    }
}

async fn deliver(
    transport: Arc<dyn Transport>,
    job: NotificationJob,
    headers: HeaderMap,
    body: String,
    config: NotifyConfig,
) {
    let max_attempts = config.max_attempts.max(1);
    loop {
        let attempt = job.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Install notification \"{}\" to {} (attempt {}/{})",
            body,
            job.target_uri(),
            attempt,
            max_attempts
        );

        let post = transport.post(job.target_uri(), headers.clone(), body.clone());
        match tokio::time::timeout(config.attempt_timeout, post).await {
            Err(_) => warn!(
                "Install notification to {} timed out after {:?}",
                job.target_uri(),
                config.attempt_timeout
            ),
            Ok(Ok(200)) => {
                debug!("Install notification to {} accepted", job.target_uri());
                job.mark_finished();
                return;
            }
            Ok(Ok(status)) => warn!(
                "Install notification to {} answered with status {}",
                job.target_uri(),
                status
            ),
            Ok(Err(e)) => warn!("Install notification to {} failed: {}", job.target_uri(), e),
        }

        if attempt >= max_attempts {
            warn!(
                "Giving up on install notification to {} after {} attempts",
                job.target_uri(),
                attempt
            );
            job.mark_finished();
            return;
        }

        tokio::time::sleep(config.retry_delay).await;
    }
}

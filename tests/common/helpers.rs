use omadl::descriptor::DESCRIPTOR_MIME;
use omadl::orchestrator::{DownloadHandle, OrchestrationState, OrchestratorBuilder, Snapshot};
use omadl::transport::{
    FetchRequest, TransferControl, Transport, TransportError, TransportErrorKind, TransportEvent,
    TransportSession,
};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

// Common test constants
pub const DD_URL: &str = "http://provider.example/media/song.dd";
pub const CONTENT_URL: &str = "http://provider.example/media/song.mp3";
pub const NOTIFY_URL: &str = "http://provider.example/notify";
pub const PLAIN_URL: &str = "http://provider.example/files/manual.pdf";
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Route library logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a temporary file with the given content
pub fn create_temp_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

// === Descriptor Helpers ===

/// A complete version 1.0 descriptor for `CONTENT_URL` reporting to `NOTIFY_URL`.
pub fn sample_descriptor_xml() -> String {
    descriptor_xml("1.0", "audio/mpeg")
}

/// A descriptor with a custom version and primary type.
pub fn descriptor_xml(version: &str, mime: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<media xmlns="http://www.openmobilealliance.org/xmlns/dd">
  <DDVersion>{version}</DDVersion>
  <name>Summer Song</name>
  <type>{mime}</type>
  <size>2048</size>
  <objectURI>{CONTENT_URL}</objectURI>
  <installNotifyURI>{NOTIFY_URL}</installNotifyURI>
  <nextURL>http://provider.example/thanks</nextURL>
  <vendor>Example Music</vendor>
  <description>A song for the summer</description>
</media>"#
    )
}

/// A descriptor that lacks its `size` element but names a notification URI.
pub fn descriptor_without_size_xml() -> String {
    format!(
        r#"<media>
  <type>audio/mpeg</type>
  <objectURI>{CONTENT_URL}</objectURI>
  <installNotifyURI>{NOTIFY_URL}</installNotifyURI>
</media>"#
    )
}

// === Transport Script Helpers ===

/// Events of a descriptor fetch whose body is `xml`, stored under `dir`.
pub fn descriptor_events(dir: &Path, xml: &str) -> Vec<TransportEvent> {
    let path = create_temp_file(dir, "song.dd", xml.as_bytes());
    vec![
        TransportEvent::Started {
            content_size: Some(xml.len() as u64),
            content_name: "song.dd".to_string(),
            mime_type: Some(DESCRIPTOR_MIME.to_string()),
            temp_path: dir.join("song.dd.part"),
        },
        TransportEvent::Progress {
            received_bytes: xml.len() as u64,
        },
        TransportEvent::Completed {
            final_path: path,
            http_status: 200,
        },
    ]
}

/// Events of a content fetch with `mime`, stored under `dir` as `name`.
pub fn content_events(dir: &Path, name: &str, mime: &str, body: &[u8]) -> Vec<TransportEvent> {
    let path = create_temp_file(dir, name, body);
    vec![
        content_started(dir, name, mime, body.len() as u64),
        TransportEvent::Progress {
            received_bytes: body.len() as u64 / 2,
        },
        TransportEvent::Progress {
            received_bytes: body.len() as u64,
        },
        TransportEvent::Completed {
            final_path: path,
            http_status: 200,
        },
    ]
}

pub fn content_started(dir: &Path, name: &str, mime: &str, size: u64) -> TransportEvent {
    TransportEvent::Started {
        content_size: Some(size),
        content_name: name.to_string(),
        mime_type: Some(mime.to_string()),
        temp_path: dir.join(format!("{}.part", name)),
    }
}

pub fn failed_events(kind: TransportErrorKind) -> Vec<TransportEvent> {
    vec![TransportEvent::Failed { error_kind: kind }]
}

// === Mock Transport ===

/// A notification POST seen by the [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posted {
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct ControlCounts {
    pub cancels: AtomicUsize,
    pub pauses: AtomicUsize,
    pub resumes: AtomicUsize,
}

struct MockControl(Arc<ControlCounts>);

impl TransferControl for MockControl {
    fn cancel(&self) {
        self.0.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.0.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.0.resumes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A [`Transport`] replaying scripted events per URL.
///
/// Each `start` consumes the next script queued for its URL. Held URLs keep
/// their session open after the script ran out, so the transfer stays
/// active until the orchestrator steps in.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<Vec<TransportEvent>>>>,
    held: Mutex<Vec<String>>,
    open: Mutex<Vec<mpsc::UnboundedSender<TransportEvent>>>,
    started: Mutex<Vec<FetchRequest>>,
    post_results: Mutex<VecDeque<Result<u16, TransportError>>>,
    hanging_posts: AtomicUsize,
    posts: Mutex<Vec<Posted>>,
    pub control: Arc<ControlCounts>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the events of the next fetch of `url`.
    pub fn script(&self, url: &str, events: Vec<TransportEvent>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(events);
        self
    }

    /// Keep sessions of `url` open once their script ran out.
    pub fn hold(&self, url: &str) -> &Self {
        self.held.lock().unwrap().push(url.to_string());
        self
    }

    /// Queue the result of the next POST. Unqueued posts answer 200.
    pub fn post_result(&self, result: Result<u16, TransportError>) -> &Self {
        self.post_results.lock().unwrap().push_back(result);
        self
    }

    /// Make the next `count` POSTs never answer.
    pub fn hang_posts(&self, count: usize) -> &Self {
        self.hanging_posts.fetch_add(count, Ordering::SeqCst);
        self
    }

    pub fn started_urls(&self) -> Vec<String> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.to_string())
            .collect()
    }

    pub fn started_requests(&self) -> Vec<FetchRequest> {
        self.started.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<Posted> {
        self.posts.lock().unwrap().clone()
    }

    pub fn post_bodies(&self) -> Vec<String> {
        self.posts().into_iter().map(|p| p.body).collect()
    }

    pub fn cancels(&self) -> usize {
        self.control.cancels.load(Ordering::SeqCst)
    }

    pub fn pauses(&self) -> usize {
        self.control.pauses.load(Ordering::SeqCst)
    }

    pub fn resumes(&self) -> usize {
        self.control.resumes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn start(&self, request: FetchRequest) -> TransportSession {
        let url = request.url.to_string();
        self.started.lock().unwrap().push(request);

        let (tx, rx) = mpsc::unbounded_channel();
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&url)
            .and_then(|queue| queue.pop_front());
        match script {
            Some(events) => {
                for event in events {
                    let _ = tx.send(event);
                }
            }
            None => {
                let _ = tx.send(TransportEvent::Failed {
                    error_kind: TransportErrorKind::Other,
                });
            }
        }
        if self.held.lock().unwrap().contains(&url) {
            self.open.lock().unwrap().push(tx);
        }

        TransportSession::new(rx, Arc::new(MockControl(self.control.clone())))
    }

    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<u16, TransportError> {
        self.posts.lock().unwrap().push(Posted {
            url: url.to_string(),
            headers,
            body,
        });
        let hang = self
            .hanging_posts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hang {
            std::future::pending::<()>().await;
        }
        self.post_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(200))
    }
}

// === Orchestrator Helpers ===

/// A hidden orchestrator builder that retries notifications without delay.
pub fn test_builder(dir: &Path) -> OrchestratorBuilder {
    OrchestratorBuilder::hidden()
        .directory(dir.to_path_buf())
        .notify_retry_delay(Duration::ZERO)
}

/// Wait for a settled outcome, failing the test instead of hanging.
pub async fn wait_settled(handle: &mut DownloadHandle) -> Snapshot {
    tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .expect("Request did not settle in time")
}

/// Poll until `handle` reports `state`.
pub async fn wait_for_state(handle: &DownloadHandle, state: OrchestrationState) {
    wait_until(|| handle.state() == state).await;
}

/// Poll `condition` until it holds, failing the test instead of hanging.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(TEST_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Condition not reached in time")
}

/// Collects every state observers are told about.
pub fn state_recorder() -> (
    Arc<Mutex<Vec<OrchestrationState>>>,
    impl Fn(&Snapshot) + Send + Sync + 'static,
) {
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = states.clone();
    (states, move |snapshot: &Snapshot| {
        sink.lock().unwrap().push(snapshot.state)
    })
}

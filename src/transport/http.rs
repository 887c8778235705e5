//! The reqwest-backed transport.
//!
//! Each call to [`HttpTransport::start`] spawns a task that streams the
//! response body into `<directory>/<name>.part`, renames it to
//! `<directory>/<name>` once complete, and reports every step as a
//! [`TransportEvent`]. Pause, resume and cancel travel over a
//! `tokio::sync::watch` channel checked between chunks.

use super::client::{create_http_client, HttpClientConfig};
use super::{
    FetchRequest, TransferControl, Transport, TransportError, TransportEvent, TransportSession,
};
use crate::utils::{content_name_from_url, content_size, media_type};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest_middleware::ClientWithMiddleware;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlSignal {
    Run,
    Pause,
    Cancel,
}

struct WatchControl(watch::Sender<ControlSignal>);

impl TransferControl for WatchControl {
    fn cancel(&self) {
        self.0.send_replace(ControlSignal::Cancel);
    }

    fn pause(&self) {
        self.0.send_if_modified(|signal| {
            if *signal == ControlSignal::Run {
                *signal = ControlSignal::Pause;
                true
            } else {
                false
            }
        });
    }

    fn resume(&self) {
        self.0.send_if_modified(|signal| {
            if *signal == ControlSignal::Pause {
                *signal = ControlSignal::Run;
                true
            } else {
                false
            }
        });
    }
}

/// A [`Transport`] over HTTP(S).
///
/// ```rust
/// use omadl::transport::{HttpClientConfig, HttpTransport};
///
/// let transport = HttpTransport::new(HttpClientConfig::default()).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Client for content and descriptor fetches, with transient retries.
    client: ClientWithMiddleware,
    /// Client for notification posts. The notifier owns the retry policy.
    notify_client: ClientWithMiddleware,
}

impl HttpTransport {
    /// Build both HTTP clients from `config`.
    pub fn new(config: HttpClientConfig) -> crate::Result<Self> {
        let notify_config = HttpClientConfig {
            retries: 0,
            ..config.clone()
        };
        Ok(Self {
            client: create_http_client(config)?,
            notify_client: create_http_client(notify_config)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn start(&self, request: FetchRequest) -> TransportSession {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = watch::channel(ControlSignal::Run);
        let client = self.client.clone();

        tokio::spawn(async move {
            let last = match fetch(&client, &request, &events_tx, control_rx).await {
                Ok(event) => event,
                Err(e) => {
                    warn!("Fetching {} failed: {}", request.url, e);
                    TransportEvent::Failed { error_kind: e.kind }
                }
            };
            // The receiver may already be gone after an abort.
            let _ = events_tx.send(last);
        });

        TransportSession::new(events_rx, Arc::new(WatchControl(control_tx)))
    }

    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<u16, TransportError> {
        debug!("Posting {} bytes to {}", body.len(), url);
        let res = self
            .notify_client
            .post(url)
            .headers(headers)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .body(body)
            .send()
            .await?;
        Ok(res.status().as_u16())
    }
}

/// Stream one response to disk. Returns the terminal event.
async fn fetch(
    client: &ClientWithMiddleware,
    request: &FetchRequest,
    events: &mpsc::UnboundedSender<TransportEvent>,
    mut control: watch::Receiver<ControlSignal>,
) -> Result<TransportEvent, TransportError> {
    debug!("Fetching {}", &request.url);
    let res = client
        .get(request.url.clone())
        .headers(request.headers.clone())
        .send()
        .await?;
    res.error_for_status_ref()?;

    let http_status = res.status().as_u16();
    let content_name = content_name_from_url(res.url());
    let final_path = request.directory.join(&content_name);
    let temp_path = request.directory.join(format!("{}.part", content_name));

    debug!("Creating destination directory {:?}", &request.directory);
    fs::create_dir_all(&request.directory).await?;
    let mut file = fs::File::create(&temp_path).await?;

    let _ = events.send(TransportEvent::Started {
        content_size: content_size(&res),
        content_name,
        mime_type: media_type(&res),
        temp_path: temp_path.clone(),
    });

    let mut received: u64 = 0;
    let mut pause_reported = false;
    let mut stream = res.bytes_stream();

    loop {
        let signal = *control.borrow_and_update();
        match signal {
            ControlSignal::Cancel => {
                drop(file);
                discard(&temp_path).await;
                return Ok(TransportEvent::Canceled);
            }
            ControlSignal::Pause => {
                if !pause_reported {
                    pause_reported = true;
                    let _ = events.send(TransportEvent::Paused);
                }
                if control.changed().await.is_err() {
                    // Nobody is listening any more.
                    drop(file);
                    discard(&temp_path).await;
                    return Ok(TransportEvent::Canceled);
                }
                continue;
            }
            ControlSignal::Run => pause_reported = false,
        }

        tokio::select! {
            changed = control.changed() => {
                if changed.is_err() {
                    drop(file);
                    discard(&temp_path).await;
                    return Ok(TransportEvent::Canceled);
                }
            }
            item = stream.next() => {
                let Some(item) = item else { break };
                let written = match item {
                    Ok(mut chunk) => {
                        let size = chunk.len() as u64;
                        file.write_all_buf(&mut chunk).await.map(|_| size).map_err(TransportError::from)
                    }
                    Err(e) => Err(TransportError::from(e)),
                };
                match written {
                    Ok(size) => {
                        received += size;
                        let _ = events.send(TransportEvent::Progress { received_bytes: received });
                    }
                    Err(e) => {
                        drop(file);
                        discard(&temp_path).await;
                        return Err(e);
                    }
                }
            }
        }
    }

    file.flush().await?;
    drop(file);
    fs::rename(&temp_path, &final_path).await?;

    Ok(TransportEvent::Completed {
        final_path,
        http_status,
    })
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        debug!("Could not remove partial file {:?}: {}", path, e);
    }
}

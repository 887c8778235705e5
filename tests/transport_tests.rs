//! Tests for the transport module functionality.
//!
//! This file contains tests for:
//! - HttpClientConfig and HttpTransport construction
//! - TransportError classification
//! - TransportSession event delivery and controls

use omadl::orchestrator::FailureKind;
use omadl::transport::{
    create_http_client, HttpClientConfig, HttpTransport, TransportError, TransportErrorKind,
    TransportEvent, TransportSession,
};
use omadl::utils::{content_name_from_url, parse_media_type};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

mod common;
use common::helpers::*;

#[test]
fn test_http_transport_creation() {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("omadl-test"));

    let config = HttpClientConfig {
        retries: 2,
        proxy: None,
        headers: Some(headers),
    };

    assert!(create_http_client(config.clone()).is_ok());
    assert!(HttpTransport::new(config).is_ok());
}

#[test]
fn test_transport_setup_returns_crate_result() -> omadl::Result<()> {
    let config = HttpClientConfig {
        retries: 0,
        ..HttpClientConfig::default()
    };

    let _client = create_http_client(config.clone())?;
    let _transport: HttpTransport = HttpTransport::new(config)?;
    Ok(())
}

#[test]
fn test_io_error_classification() {
    let full = TransportError::from(io::Error::from(io::ErrorKind::StorageFull));
    assert_eq!(full.kind, TransportErrorKind::NoSpace);

    let denied = TransportError::from(io::Error::from(io::ErrorKind::PermissionDenied));
    assert_eq!(denied.kind, TransportErrorKind::Io);
}

#[test]
fn test_error_display() {
    let error = TransportError::new(TransportErrorKind::Http(404), "not found");
    assert_eq!(error.to_string(), "http status 404: not found");
}

#[test]
fn test_failure_kind_from_transport() {
    assert_eq!(
        FailureKind::from(TransportErrorKind::Timeout),
        FailureKind::NetworkFail
    );
    assert_eq!(
        FailureKind::from(TransportErrorKind::Other),
        FailureKind::EngineFail
    );
    assert_eq!(FailureKind::InvalidUrl.install_status().code(), 954);
    assert_eq!(FailureKind::EngineFail.install_status().code(), 952);
}

#[test]
fn test_content_name_and_media_type() {
    let url = Url::parse("http://provider.example/media/Summer%20Song.mp3?id=1").unwrap();
    assert_eq!(content_name_from_url(&url), "Summer Song.mp3");

    assert_eq!(
        parse_media_type("Application/VND.OMA.DD+XML; charset=utf-8").as_deref(),
        Some("application/vnd.oma.dd+xml")
    );
}

#[tokio::test]
async fn test_session_delivers_events_in_order() {
    let dir = create_temp_dir();
    let (tx, rx) = mpsc::unbounded_channel();
    let transport = MockTransport::new();
    let mut session = TransportSession::new(rx, Arc::new(NoopControl));

    for event in content_events(dir.path(), "a.bin", "application/octet-stream", b"1234") {
        tx.send(event).unwrap();
    }
    drop(tx);

    let mut received = Vec::new();
    while let Some(event) = session.next_event().await {
        received.push(event);
    }

    assert_eq!(received.len(), 4);
    assert!(matches!(received[0], TransportEvent::Started { .. }));
    assert_eq!(
        received[2],
        TransportEvent::Progress { received_bytes: 4 }
    );
    assert!(matches!(received[3], TransportEvent::Completed { .. }));
    assert_eq!(transport.cancels(), 0);
}

#[tokio::test]
async fn test_unscripted_fetch_fails() {
    let dir = create_temp_dir();
    let transport = MockTransport::new();
    let mut session = omadl::Transport::start(
        &transport,
        omadl::transport::FetchRequest {
            url: Url::parse(PLAIN_URL).unwrap(),
            headers: HeaderMap::new(),
            directory: dir.path().to_path_buf(),
        },
    );

    session.cancel();
    assert_eq!(
        session.next_event().await,
        Some(TransportEvent::Failed {
            error_kind: TransportErrorKind::Other
        })
    );
    assert_eq!(session.next_event().await, None);
    assert_eq!(transport.cancels(), 1);
}

struct NoopControl;

impl omadl::transport::TransferControl for NoopControl {
    fn cancel(&self) {}
    fn pause(&self) {}
    fn resume(&self) {}
}

//! Notify module containing the install notification sender.
//!
//! After an OMA download reaches an outcome, the status is reported with an
//! HTTP POST to the descriptor's `installNotifyURI`. The body is plain text,
//! `"<code> <reason>"`, and delivery is retried up to a fixed ceiling.
//!
//! - [`status`] - The status code table
//! - [`sender`] - The sender and its jobs
//!
//! # Examples
//!
//! ```rust,no_run
//! use omadl::notify::{NotificationSender, NotifyConfig};
//! use omadl::transport::{HttpClientConfig, HttpTransport};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::new(HttpClientConfig::default())?);
//! let sender = NotificationSender::new(transport, NotifyConfig::default());
//!
//! let job = sender.send("http://example.com/notify", 900);
//! job.wait_finished().await;
//! println!("Report sent in {} attempt(s)", job.attempts());
//! # Ok(())
//! # }
//! ```

pub mod sender;
pub mod status;

pub use sender::{NotificationJob, NotificationSender, NotifyConfig};
pub use status::{notification_body, InstallStatus};

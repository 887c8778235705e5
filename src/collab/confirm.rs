//! User confirmation of a parsed descriptor.

use crate::descriptor::DescriptorSummary;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The user's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResponse {
    Accepted,
    Declined,
}

/// Presents a descriptor summary and waits for the user's decision.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn present_confirmation(&self, summary: &DescriptorSummary) -> ConfirmResponse;
}

/// Answers every confirmation with the same response.
///
/// ```rust
/// use omadl::collab::{AutoConfirm, ConfirmResponse};
///
/// let confirm = AutoConfirm::accept();
/// assert_eq!(confirm.response(), ConfirmResponse::Accepted);
/// ```
#[derive(Debug)]
pub struct AutoConfirm {
    response: ConfirmResponse,
    presented: AtomicUsize,
}

impl AutoConfirm {
    pub fn new(response: ConfirmResponse) -> Self {
        Self {
            response,
            presented: AtomicUsize::new(0),
        }
    }

    pub fn accept() -> Self {
        Self::new(ConfirmResponse::Accepted)
    }

    pub fn decline() -> Self {
        Self::new(ConfirmResponse::Declined)
    }

    pub fn response(&self) -> ConfirmResponse {
        self.response
    }

    /// How many summaries were presented.
    pub fn presented(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }
}

impl Default for AutoConfirm {
    fn default() -> Self {
        Self::accept()
    }
}

#[async_trait]
impl Confirmation for AutoConfirm {
    async fn present_confirmation(&self, summary: &DescriptorSummary) -> ConfirmResponse {
        self.presented.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Auto-answering {:?} for {:?}", self.response, summary.name);
        self.response
    }
}

//! Progress display shared by every request of an orchestrator.

use super::style::StyleOptions;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use std::sync::Arc;

/// Coordinates the overall bar and one transfer bar per active request.
#[derive(Clone)]
pub struct ProgressDisplay {
    multi: Arc<MultiProgress>,
    overall: ProgressBar,
    style_options: StyleOptions,
}

impl std::fmt::Debug for ProgressDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressDisplay")
            .field("style_options", &self.style_options)
            .finish()
    }
}

impl ProgressDisplay {
    /// Create a new progress display.
    pub fn new(style_options: StyleOptions) -> Self {
        let multi = match style_options.is_enabled() {
            true => Arc::new(MultiProgress::new()),
            false => Arc::new(MultiProgress::with_draw_target(ProgressDrawTarget::hidden())),
        };
        let overall = multi.add(style_options.overall().to_progress_bar(0));

        Self {
            multi,
            overall,
            style_options,
        }
    }

    /// Account for one more submitted request.
    pub fn add_request(&self) {
        self.overall.inc_length(1);
    }

    /// Create a transfer bar for `name`. `size` may be unknown.
    pub fn create_transfer(&self, name: &str, size: Option<u64>) -> ProgressBar {
        let pb = self
            .multi
            .add(self.style_options.transfer().to_progress_bar(size.unwrap_or(0)));
        pb.set_message(name.to_string());
        pb
    }

    /// Finish a transfer bar based on configuration.
    pub fn finish_transfer(&self, pb: ProgressBar) {
        if self.style_options.transfer().clear {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
    }

    /// Count one request as done.
    pub fn complete_request(&self) {
        self.overall.inc(1);
        if Some(self.overall.position()) == self.overall.length() {
            if self.style_options.overall().clear {
                self.overall.finish_and_clear();
            } else {
                self.overall.finish();
            }
        }
    }

    pub fn overall(&self) -> &ProgressBar {
        &self.overall
    }
}

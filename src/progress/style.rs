//! Progress bar styling.
//!
//! Two bars are styled separately: the overall bar counting requests that
//! reached an outcome, and the per-transfer bar counting content bytes.
//!
//! # Examples
//!
//! ```rust
//! use omadl::progress::{ProgressBarOpts, StyleOptions};
//!
//! let style_options = StyleOptions::new(
//!     ProgressBarOpts::hidden(),
//!     ProgressBarOpts::with_transfer_style(),
//! );
//! assert!(style_options.is_enabled());
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// Style options of the overall and per-transfer bars.
///
/// By default the overall bar stays on screen, transfer bars are cleared
/// once their request reaches an outcome.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub(crate) overall: ProgressBarOpts,
    pub(crate) transfer: ProgressBarOpts,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            overall: ProgressBarOpts {
                template: Some(ProgressBarOpts::TEMPLATE_REQUESTS.into()),
                progress_chars: Some(ProgressBarOpts::CHARS_FINE.into()),
                enabled: true,
                clear: false,
            },
            transfer: ProgressBarOpts::with_transfer_style(),
        }
    }
}

impl StyleOptions {
    /// Create new [`StyleOptions`].
    pub fn new(overall: ProgressBarOpts, transfer: ProgressBarOpts) -> Self {
        Self { overall, transfer }
    }

    /// Both bars hidden.
    pub fn hidden() -> Self {
        Self::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden())
    }

    /// Return `false` if neither bar is enabled.
    pub fn is_enabled(&self) -> bool {
        self.overall.enabled || self.transfer.enabled
    }

    pub fn overall(&self) -> &ProgressBarOpts {
        &self.overall
    }

    pub fn transfer(&self) -> &ProgressBarOpts {
        &self.transfer
    }
}

/// Options for a single progress bar.
#[derive(Debug, Clone)]
pub struct ProgressBarOpts {
    template: Option<String>,
    /// At least 3 characters: "filled", "current" and "to do".
    progress_chars: Option<String>,
    pub(crate) enabled: bool,
    /// Clear the bar once completed.
    pub(crate) clear: bool,
}

impl Default for ProgressBarOpts {
    fn default() -> Self {
        Self {
            template: None,
            progress_chars: None,
            enabled: true,
            clear: true,
        }
    }
}

impl ProgressBarOpts {
    /// `█████████████████████           3/5 requests`
    pub const TEMPLATE_REQUESTS: &'static str = "{bar:40.blue} {pos:>}/{len} requests";
    /// `song.mp3 ━━━━━━━━━━━╾─── 211.23 KiB/300.00 KiB 1008.31 KiB/s eta 0s`
    pub const TEMPLATE_TRANSFER: &'static str =
        "{msg:20} {bar:40.green/black} {bytes:>11.green}/{total_bytes:<11.green} {bytes_per_sec:>13.red} eta {eta:.blue}";
    pub const CHARS_FINE: &'static str = "█▉▊▋▌▍▎▏  ";
    pub const CHARS_LINE: &'static str = "━╾╴─";

    /// Create a new [`ProgressBarOpts`].
    pub fn new(
        template: Option<String>,
        progress_chars: Option<String>,
        enabled: bool,
        clear: bool,
    ) -> Self {
        Self {
            template,
            progress_chars,
            enabled,
            clear,
        }
    }

    /// Byte-counting style for content transfers.
    pub fn with_transfer_style() -> Self {
        Self {
            template: Some(Self::TEMPLATE_TRANSFER.into()),
            progress_chars: Some(Self::CHARS_LINE.into()),
            enabled: true,
            clear: true,
        }
    }

    /// A bar that never draws.
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..ProgressBarOpts::default()
        }
    }

    /// Set to `true` to clear the progress bar upon completion.
    pub fn set_clear(&mut self, clear: bool) {
        self.clear = clear;
    }

    /// Build the [`ProgressStyle`]. An invalid template falls back to the default bar.
    pub fn to_progress_style(&self) -> ProgressStyle {
        let mut style = ProgressStyle::default_bar();
        if let Some(ref template) = self.template {
            match ProgressStyle::default_bar().template(template) {
                Ok(s) => style = s,
                Err(e) => warn!("Invalid progress template {:?}: {}", template, e),
            }
        }
        if let Some(ref progress_chars) = self.progress_chars {
            style = style.progress_chars(progress_chars);
        }
        style
    }

    /// Build a [`ProgressBar`] of length `len`, hidden when disabled.
    pub fn to_progress_bar(&self, len: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        ProgressBar::new(len).with_style(self.to_progress_style())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar() {
        let pb = ProgressBarOpts::hidden().to_progress_bar(100);
        assert!(pb.is_hidden());
        assert!(!StyleOptions::hidden().is_enabled());
    }

    #[test]
    fn test_default_style_enabled() {
        let style = StyleOptions::default();
        assert!(style.is_enabled());
        assert!(!style.overall().clear);
        assert!(style.transfer().clear);
    }

    #[test]
    fn test_invalid_template_falls_back() {
        let opts = ProgressBarOpts::new(Some("{bar:abc".to_string()), None, true, true);
        let _ = opts.to_progress_style();
    }
}

//! Progress module containing progress bar functionality.
//!
//! Content transfers are rendered with `indicatif`: one overall bar counts
//! requests that reached an outcome, one bar per request follows its bytes.
//!
//! - `style` - Progress bar styling options and templates
//! - `display` - Progress bar coordination
//!
//! # Examples
//!
//! ```rust
//! use omadl::orchestrator::OrchestratorBuilder;
//! use omadl::progress::StyleOptions;
//!
//! let builder = OrchestratorBuilder::new().style_options(StyleOptions::hidden());
//! ```

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};

//! Collab module containing the collaborators the orchestrator consumes.
//!
//! The user interface and the download history live outside this crate.
//! They plug in through the [`Confirmation`] and [`Persistence`] traits.
//!
//! - [`confirm`] - Asking the user whether to fetch the described content
//! - [`history`] - Recording requests and their state

pub mod confirm;
pub mod history;

pub use confirm::{AutoConfirm, ConfirmResponse, Confirmation};
pub use history::{HistoryId, HistoryRecord, MemoryHistory, NoHistory, Persistence};

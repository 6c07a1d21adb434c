//! Core types shared by every stage of the importer
//!
//! - [`error`] - [`ImporterError`] and user-facing [`ErrorContext`] formatting
//! - [`operation_context`] - the [`RunContext`] threaded through a run

pub mod error;
pub mod operation_context;

pub use error::{ErrorContext, ImporterError, user_friendly_error};
pub use operation_context::{RunContext, Verbosity};

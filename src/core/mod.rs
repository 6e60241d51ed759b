//! Core types shared by the checker
//!
//! ## `error` - Run errors
//!
//! - [`CheckerError`] - failures that stop a run (bad argument, unreadable tree)
//! - [`ErrorContext`] - error wrapper with details and a suggestion
//! - [`user_friendly_error`] - convert any `anyhow::Error` for CLI display

pub mod error;

pub use error::{CheckerError, ErrorContext, user_friendly_error};

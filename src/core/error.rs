//! Error handling for the template checker
//!
//! The checker distinguishes two kinds of trouble:
//!
//! 1. **Run errors** ([`CheckerError`]): the run itself cannot proceed, e.g. the
//!    path argument is missing or points nowhere. These bubble up through
//!    `anyhow` and end the process with exit code 1.
//! 2. **Template failures** (see [`crate::templating::TemplateFailure`]): a single
//!    template is broken. Those are values, reported one line each, and never
//!    abort the remaining templates.
//!
//! Use [`user_friendly_error`] to turn any run error into an [`ErrorContext`]
//! carrying a suggestion for the user.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ansible_template_checker::core::{CheckerError, ErrorContext};
//!
//! let context = ErrorContext::new(CheckerError::MissingPath)
//!     .with_suggestion("Pass the roles/ directory or a single .j2 file");
//!
//! // Colored output on stderr
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Errors that stop a check run before or while templates are collected.
#[derive(Error, Debug)]
pub enum CheckerError {
    /// No path argument was given on the command line.
    #[error("Please provide a path for testing")]
    MissingPath,

    /// The path argument resolved to neither a file nor a directory.
    #[error("Provided arg ({arg}) is not a file or directory.")]
    InvalidPath {
        /// The argument exactly as the user typed it
        arg: String,
    },

    /// The directory to walk could not be read.
    #[error("Failed to walk directory '{path}': {reason}")]
    WalkFailed {
        /// Directory being walked
        path: String,
        /// Underlying walker error
        reason: String,
    },

    /// The current working directory could not be determined.
    #[error("Unable to determine the current working directory")]
    CurrentDirUnavailable,

    /// Anything that does not fit the categories above.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// An error decorated with optional details and a suggestion for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: CheckerError,
    /// What the user can do about it
    pub suggestion: Option<String>,
    /// Extra information, e.g. the rest of an error chain
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without suggestion or details.
    #[must_use]
    pub const fn new(error: CheckerError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any run error into an [`ErrorContext`] with a suggestion.
///
/// The error chain is searched for a [`CheckerError`] or an [`std::io::Error`];
/// anything else is wrapped as [`CheckerError::Other`] with the full chain in
/// the details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain = error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>().join(": ");

    let error = match error.downcast::<CheckerError>() {
        Ok(checker_error) => return create_error_context(checker_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        let suggestion = match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                "Check that the templates are readable by the current user"
            }
            std::io::ErrorKind::NotFound => "Check that the path exists and try again",
            _ => "Check the path and file system state and try again",
        };
        return ErrorContext::new(CheckerError::Other {
            message: error.to_string(),
        })
        .with_details(io_error.to_string())
        .with_suggestion(suggestion);
    }

    let context = ErrorContext::new(CheckerError::Other {
        message: error.to_string(),
    });
    if chain.is_empty() {
        context
    } else {
        context.with_details(chain)
    }
}

fn create_error_context(error: CheckerError) -> ErrorContext {
    match error {
        CheckerError::MissingPath => ErrorContext::new(error)
            .with_suggestion("Run with a directory (e.g. 'roles/') or a single template file"),
        CheckerError::InvalidPath {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Relative paths are resolved against the current working directory",
        ),
        CheckerError::WalkFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check directory permissions and broken symbolic links"),
        CheckerError::CurrentDirUnavailable => ErrorContext::new(error)
            .with_suggestion("Pass an absolute path or run from an existing directory"),
        other => ErrorContext::new(other),
    }
}

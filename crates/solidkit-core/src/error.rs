//! Error handling for SolidKit
//!
//! Interactive operations fail in a few distinct ways and callers treat each
//! one differently:
//! - [`Error::Cancel`] means the user abandoned the operation (Escape, clicking
//!   away, a newer command replacing this one). It is never logged.
//! - [`Error::NoOp`] and [`Error::AlreadyFinished`] are expected outcomes of
//!   ordinary interaction and are swallowed silently.
//! - [`Error::Validation`] means a geometric or parameter precondition was
//!   violated. It is reported as a warning.
//! - [`Error::Other`] is everything unexpected and is reported at error level.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Error type shared by cancellable operations, gizmos and commands.
#[derive(Error, Debug)]
pub enum Error {
    /// The user abandoned the operation
    #[error("Operation cancelled")]
    Cancel,

    /// The operation would not change anything
    #[error("Operation has no effect")]
    NoOp,

    /// A resource was handed to a command that already reached a terminal state
    #[error("Command already finished")]
    AlreadyFinished,

    /// A geometric or parameter precondition was violated
    #[error("{message}")]
    Validation {
        /// Human readable reason, shown next to the command title.
        message: String,
    },

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// How loudly an error should be reported once it reaches the top of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected during normal interaction; not reported.
    Silent,
    /// Reported with `warn!`.
    Warning,
    /// Reported with `error!`.
    Error,
}

impl Error {
    /// Create a validation error from a message
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Create an unexpected error from a message
    pub fn other(message: impl Into<String>) -> Self {
        Error::Other(anyhow::anyhow!(message.into()))
    }

    /// Check if this is the cancel sentinel
    pub fn is_cancel(&self) -> bool {
        matches!(self, Error::Cancel)
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Classify the error for reporting
    pub fn severity(&self) -> Severity {
        match self {
            Error::Cancel | Error::NoOp | Error::AlreadyFinished => Severity::Silent,
            Error::Validation { .. } => Severity::Warning,
            Error::Other(_) => Severity::Error,
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

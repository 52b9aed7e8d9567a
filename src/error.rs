//! Error types for the AMP CSS validator
//!
//! Problems found *in* a stylesheet are never Rust errors: they are
//! [`ErrorToken`](crate::diagnostics::ErrorToken)s appended to an accumulator.
//! `ValidatorError` covers the environment and the caller: unreadable files,
//! bad configuration, invalid arguments.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Directory traversal error: {message}")]
    Walk { message: String },

    #[error("Watch error: {message}")]
    Watch { message: String },

    #[error("{failed} of {total} stylesheets failed validation")]
    ValidationFailed { failed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, ValidatorError>;

impl ValidatorError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn walk(message: impl Into<String>) -> Self {
        Self::Walk {
            message: message.into(),
        }
    }

    pub fn watch(message: impl Into<String>) -> Self {
        Self::Watch {
            message: message.into(),
        }
    }
}

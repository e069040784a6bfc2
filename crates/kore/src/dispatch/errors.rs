//! Error types for handler dispatch failures.
//!
//! Web routing failures never surface here: an unknown path becomes a 404
//! response. Command dispatch reports every failure mode as a
//! [`DispatchError`] so binaries can print it and choose an exit status.

use thiserror::Error;

use crate::lock::LockError;

/// Errors surfaced while resolving or running a command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The argument vector has no command token.
    #[error("unable to find command name")]
    MissingCommand,

    /// No command is registered under the attempted identifier.
    #[error("unable to load command class -> {identifier}")]
    CommandNotFound {
        /// Identifier the command token resolved to.
        identifier: String,
    },

    /// The command lock could not be inspected or created.
    #[error("command lock failed: {0}")]
    Lock(#[from] LockError),

    /// The handler body failed and its error hook propagated the failure.
    #[error("{identifier} failed: {source}")]
    Handler {
        /// Handler whose body failed.
        identifier: String,
        /// Failure raised by the body.
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Returns the exit status code for this error.
    ///
    /// Usage errors return status 2. Lock and handler failures return
    /// status 1.
    #[must_use]
    pub const fn exit_status(&self) -> i32 {
        match self {
            Self::MissingCommand | Self::CommandNotFound { .. } => 2,
            Self::Lock(_) | Self::Handler { .. } => 1,
        }
    }

    /// Creates a command-not-found error.
    #[must_use]
    pub fn command_not_found(identifier: impl Into<String>) -> Self {
        Self::CommandNotFound {
            identifier: identifier.into(),
        }
    }

    /// Creates a handler failure error.
    #[must_use]
    pub fn handler(identifier: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Handler {
            identifier: identifier.into(),
            source,
        }
    }
}

//! Error types for the binary entry points.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use kore::BootstrapError;
use kore::dispatch::DispatchError;
use kore::telemetry::TelemetryError;
use ortho_config::OrthoError;
use thiserror::Error;

/// Failures that end a `kore` or `kore-cgi` run.
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings flags, variables or file were invalid.
    #[error("failed to load settings: {0}")]
    LoadSettings(#[source] Arc<OrthoError>),
    /// The application context could not be built.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The tracing subscriber could not be installed.
    #[error("failed to install telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    /// A command-line token was not valid UTF-8.
    #[error("argument is not valid UTF-8: {0}")]
    NonUtf8Argument(String),
    /// Routing or the handler itself failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// The CGI request body could not be read.
    #[error("failed to read request body: {0}")]
    ReadRequest(#[source] io::Error),
    /// The CGI response could not be written.
    #[error("failed to write response: {0}")]
    WriteResponse(#[source] io::Error),
}

impl AppError {
    /// Process status reported for this error.
    ///
    /// Dispatch errors keep their own status; everything else is a plain
    /// failure.
    #[must_use]
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Dispatch(error) => status_byte(error.exit_status()),
            _ => 1,
        }
    }

    /// [`AppError::exit_status`] as an [`ExitCode`].
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

fn status_byte(status: i32) -> u8 {
    u8::try_from(status)
        .ok()
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

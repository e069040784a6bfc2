//! Global tracing subscriber installation.

use std::io::{self, IsTerminal};

use kore_config::{LogFormat, Settings};
use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::log::Logger;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the stderr formatter and the file sink as the global subscriber.
///
/// Only the first call installs anything; later calls return a fresh handle.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter expression is invalid or a
/// global subscriber is already installed by someone else.
pub fn initialise(settings: &Settings, logger: &Logger) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(settings, logger))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(settings: &Settings, logger: &Logger) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&settings.log_filter)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let base = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(io::stderr)
        // Colour only on interactive terminals.
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let stderr: Box<dyn Layer<Registry> + Send + Sync> = match settings.log_format {
        LogFormat::Json => base.json().flatten_event(true).with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_filter(filter).boxed(),
    };

    let subscriber = tracing_subscriber::registry()
        .with(stderr)
        .with(logger.layer());
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

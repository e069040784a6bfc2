//! Built-in defaults for framework settings.

use std::env;
use std::time::Duration;

use camino::Utf8PathBuf;

use crate::logging::{LogFormat, LogLevel};

/// Controller name used when a request path is empty.
pub const DEFAULT_CONTROLLER: &str = "index";

/// Logger name used by controllers that do not override it.
pub const DEFAULT_MODULE_NAME: &str = "app";

/// Lock window applied to commands that do not override it (24 hours).
pub const DEFAULT_LOCK_SECS: u64 = 60 * 60 * 24;

/// Default stderr log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default stderr log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default stderr logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default minimum level for the application log files.
#[must_use]
pub const fn default_log_level() -> LogLevel {
    LogLevel::Debug
}

/// Default command lock window.
#[must_use]
pub const fn default_lock_duration() -> Duration {
    Duration::from_secs(DEFAULT_LOCK_SECS)
}

/// Application directory used when none is configured: the working directory.
#[must_use]
pub fn default_app_dir() -> Utf8PathBuf {
    env::current_dir()
        .ok()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

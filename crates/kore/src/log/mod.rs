//! Date-stamped, levelled line logging to files.
//!
//! [`Logger`] holds the active log name and minimum level. Handlers re-point
//! it at their own module name when they start. Lines reach the file sink
//! through [`FileLogLayer`], so every component logs with plain `tracing`
//! macros:
//!
//! ```text
//! [2024-01-31 09:15:02.123456][4242][INFO][kore::dispatch::web:88][START][GET]controllers::index
//! ```
//!
//! An event carrying a `dump` field writes the field on the following line.

mod layer;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use camino::{Utf8Path, Utf8PathBuf};
use kore_config::{DEFAULT_MODULE_NAME, LogLevel};
use time::OffsetDateTime;
use time::macros::format_description;

pub use layer::FileLogLayer;

#[derive(Debug)]
struct LoggerState {
    name: String,
    level: LogLevel,
}

/// Shared handle to the process log state.
///
/// Clones observe the same name and level.
#[derive(Debug, Clone)]
pub struct Logger {
    logs_dir: Utf8PathBuf,
    state: Arc<RwLock<LoggerState>>,
    dropped: Arc<AtomicU64>,
}

impl Logger {
    /// Creates a logger writing under `logs_dir` with the default module name.
    #[must_use]
    pub fn new(logs_dir: impl Into<Utf8PathBuf>, level: LogLevel) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            state: Arc::new(RwLock::new(LoggerState {
                name: DEFAULT_MODULE_NAME.to_owned(),
                level,
            })),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Re-points the logger at `name` with minimum `level`.
    pub fn init(&self, name: &str, level: LogLevel) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        name.clone_into(&mut state.name);
        state.level = level;
    }

    /// Active log name.
    #[must_use]
    pub fn name(&self) -> String {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .name
            .clone()
    }

    /// Active minimum level.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.state.read().unwrap_or_else(PoisonError::into_inner).level
    }

    /// Returns true when a line of `severity` would be written.
    #[must_use]
    pub fn enabled(&self, severity: LogLevel) -> bool {
        self.level().allows(severity)
    }

    /// Directory receiving the log files.
    #[must_use]
    pub fn logs_dir(&self) -> &Utf8Path {
        &self.logs_dir
    }

    /// File that lines written now end up in.
    #[must_use]
    pub fn current_file(&self) -> Utf8PathBuf {
        let date = now()
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_else(|_| String::from("unknown-date"));
        self.logs_dir.join(format!("{}-{date}.log", self.name()))
    }

    /// Number of lines lost because the sink could not be written.
    #[must_use]
    pub fn dropped_lines(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Appends one line when `severity` passes the active level.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while creating the directory or appending
    /// to the file.
    pub fn write_line(
        &self,
        severity: LogLevel,
        caller: &str,
        message: &str,
        dump: Option<&str>,
    ) -> io::Result<()> {
        if !self.enabled(severity) {
            return Ok(());
        }

        let stamp = now()
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
            ))
            .map_err(|error| io::Error::other(error.to_string()))?;
        let mut line = format!(
            "[{stamp}][{pid}][{level}][{caller}]{message}\n",
            pid = process::id(),
            level = severity.as_str(),
        );
        if let Some(extra) = dump {
            line.push_str(extra);
            line.push('\n');
        }

        fs::create_dir_all(&self.logs_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_file())?;
        file.write_all(line.as_bytes())
    }

    /// Tracing layer forwarding events to this logger.
    #[must_use]
    pub fn layer(&self) -> FileLogLayer {
        FileLogLayer::new(self.clone())
    }

    fn record_failure(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

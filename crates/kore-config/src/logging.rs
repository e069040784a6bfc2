//! Log level and telemetry format enums shared by settings and the logger.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported output formats for stderr telemetry.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Severity threshold for the application log files.
///
/// Levels are ordered: a line is written when the active minimum level is at
/// or below the severity of the line.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevel {
    /// Verbose diagnostics, including executed statements.
    #[default]
    Debug,
    /// Lifecycle milestones such as handler start and end.
    Info,
    /// Recoverable anomalies, for example a skipped locked command.
    Warn,
    /// Failures surfaced by handlers, storage or transport.
    Error,
}

impl LogLevel {
    /// Returns the upper-case name written into log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Returns true when a line of `severity` passes this minimum level.
    #[must_use]
    pub fn allows(self, severity: Self) -> bool {
        self <= severity
    }
}

/// Errors encountered while parsing a [`LogLevel`] from text.
pub type LogLevelParseError = strum::ParseError;

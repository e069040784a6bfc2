//! Framework settings layered from defaults, a TOML file, the environment and
//! command-line flags.
//!
//! Precedence increases in that order: a flag beats a `KORE_*` variable,
//! which beats the settings file, which beats the built-in defaults. The
//! settings file is the one named by `--config-path` or `KORE_CONFIG_PATH`,
//! or `.kore.toml` discovered in the working or home directory.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_CONTROLLER, DEFAULT_LOCK_SECS, default_app_dir, default_log_filter,
    default_log_format, default_log_level,
};
use crate::logging::{LogFormat, LogLevel};
use crate::paths::AppPaths;

/// Flags understood by the settings loader.
///
/// MAINTENANCE: keep this list in sync with the fields of [`Settings`]. The
/// binaries use it to separate framework flags from the command tokens that
/// follow them.
pub const SETTINGS_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--app-dir",
    "--env",
    "--base-path",
    "--default-controller",
    "--lock-secs",
    "--log-level",
    "--log-filter",
    "--log-format",
];

/// Resolved framework settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "KORE")]
pub struct Settings {
    /// Root directory of the application.
    #[ortho_config(default = default_app_dir())]
    pub app_dir: Utf8PathBuf,
    /// Environment name selecting `config-<env>.toml`.
    pub env: Option<String>,
    /// Prefix stripped from request paths before routing.
    pub base_path: Option<String>,
    /// Controller used when the request path is empty.
    #[ortho_config(default = DEFAULT_CONTROLLER.to_owned())]
    pub default_controller: String,
    /// Seconds a command lock stays fresh.
    #[ortho_config(default = DEFAULT_LOCK_SECS)]
    pub lock_secs: u64,
    /// Initial minimum level of the application log files.
    #[ortho_config(default = default_log_level())]
    pub log_level: LogLevel,
    /// `EnvFilter` expression for stderr telemetry.
    #[ortho_config(default = default_log_filter().to_owned())]
    pub log_filter: String,
    /// Output format for stderr telemetry.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_dir: default_app_dir(),
            env: None,
            base_path: None,
            default_controller: DEFAULT_CONTROLLER.to_owned(),
            lock_secs: DEFAULT_LOCK_SECS,
            log_level: default_log_level(),
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
        }
    }
}

impl Settings {
    /// Directory layout derived from the application directory.
    #[must_use]
    pub fn paths(&self) -> AppPaths {
        AppPaths::new(self.app_dir.clone())
    }

    /// Lock freshness window as a [`Duration`].
    #[must_use]
    pub const fn lock_duration(&self) -> Duration {
        Duration::from_secs(self.lock_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let settings = Settings::load_from_iter(["kore"]).expect("load defaults");
        assert_eq!(settings.default_controller, "index");
        assert_eq!(settings.lock_secs, DEFAULT_LOCK_SECS);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert!(settings.base_path.is_none());
    }

    #[test]
    fn flags_fill_every_field() {
        let settings = Settings::load_from_iter([
            "kore",
            "--app-dir",
            "/srv/app",
            "--env",
            "test",
            "--base-path=shop",
            "--lock-secs=5",
            "--log-level",
            "warn",
            "--log-format=compact",
        ])
        .expect("load settings");
        assert_eq!(settings.app_dir, Utf8PathBuf::from("/srv/app"));
        assert_eq!(settings.env.as_deref(), Some("test"));
        assert_eq!(settings.base_path.as_deref(), Some("shop"));
        assert_eq!(settings.log_level, LogLevel::Warn);
        assert_eq!(settings.log_format, LogFormat::Compact);
        assert_eq!(settings.lock_duration(), Duration::from_secs(5));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let result = Settings::load_from_iter(["kore", "--bogus"]);
        assert!(result.is_err(), "unknown flag must fail");
    }

    #[test]
    fn malformed_flag_values_are_rejected() {
        let result = Settings::load_from_iter(["kore", "--lock-secs", "soon"]);
        assert!(result.is_err(), "non-numeric lock window must fail");
    }

    #[test]
    fn paths_follow_app_dir() {
        let settings = Settings {
            app_dir: Utf8PathBuf::from("/srv/app"),
            ..Settings::default()
        };
        assert_eq!(settings.paths().logs_dir().as_str(), "/srv/app/tmp/logs");
    }
}

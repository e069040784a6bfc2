//! Configuration primitives shared by the Kore framework and its binaries.
//!
//! Two kinds of configuration live here. [`Settings`] carries the framework's
//! own knobs (application directory, environment, base path, lock window,
//! logging) layered by `ortho_config` from defaults, a `.kore.toml` file,
//! `KORE_*` variables and flags.
//! [`ConfigStore`] holds the application's configuration files and answers
//! dotted-key lookups such as `db.path`.

mod defaults;
mod logging;
mod paths;
mod settings;
mod store;

pub use defaults::{
    DEFAULT_CONTROLLER, DEFAULT_LOCK_SECS, DEFAULT_LOG_FILTER, DEFAULT_MODULE_NAME,
    default_app_dir, default_lock_duration, default_log_filter, default_log_format,
    default_log_level,
};
pub use logging::{LogFormat, LogFormatParseError, LogLevel, LogLevelParseError};
pub use paths::{AppPaths, AppPathsError};
pub use settings::{SETTINGS_CLI_FLAGS, Settings};
pub use store::{ConfigStore, ConfigStoreError, lookup_dotted};

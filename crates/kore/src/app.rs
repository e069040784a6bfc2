//! Per-process application context.

use std::rc::Rc;

use kore_config::{AppPaths, AppPathsError, ConfigStore, ConfigStoreError, Settings};
use thiserror::Error;
use tracing::debug;

use crate::db::{DEFAULT_DATABASE_KEY, Database, Databases, DbError};
use crate::http::HttpClient;
use crate::log::Logger;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::web::Views;

const APP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::app");

/// Errors raised while building the application context.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The tmp or logs directory could not be created.
    #[error(transparent)]
    Paths(#[from] AppPathsError),
    /// The configuration files could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigStoreError),
}

/// Owns everything a handler reaches for: settings, directory layout,
/// configuration, the logger, database connections and views.
///
/// Built once at process start and passed by reference to the routers.
#[derive(Debug)]
pub struct App {
    settings: Settings,
    paths: AppPaths,
    config: ConfigStore,
    logger: Logger,
    databases: Databases,
    views: Views,
}

impl App {
    /// Creates the tmp and logs directories and loads the configuration for
    /// the configured environment.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] when a directory cannot be created or the
    /// environment configuration file is missing or malformed.
    pub fn bootstrap(settings: Settings) -> Result<Self, BootstrapError> {
        let paths = settings.paths();
        paths.prepare()?;
        let config = ConfigStore::load(&paths, settings.env.as_deref())?;
        debug!(
            target: APP_TARGET,
            app_dir = %paths.app_dir(),
            env = settings.env.as_deref().unwrap_or("default"),
            "application bootstrapped"
        );
        Ok(Self::with_config(settings, config))
    }

    /// Builds the context around an already loaded configuration.
    #[must_use]
    pub fn with_config(settings: Settings, config: ConfigStore) -> Self {
        let paths = settings.paths();
        let logger = Logger::new(paths.logs_dir(), settings.log_level);
        let views = Views::new(paths.views_dir());
        Self {
            settings,
            paths,
            config,
            logger,
            databases: Databases::new(),
            views,
        }
    }

    /// Framework settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Directory layout.
    #[must_use]
    pub const fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Application configuration.
    #[must_use]
    pub const fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// File logger handle.
    #[must_use]
    pub const fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Views under the views directory.
    #[must_use]
    pub const fn views(&self) -> &Views {
        &self.views
    }

    /// Connection for configuration section `key`, opened on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when the section is missing or malformed, or the
    /// database cannot be opened.
    pub fn db(&self, key: &str) -> Result<Rc<Database>, DbError> {
        self.databases
            .connection(key, &self.config, self.paths.app_dir())
    }

    /// Connection for the `database` section.
    ///
    /// # Errors
    ///
    /// See [`App::db`].
    pub fn database(&self) -> Result<Rc<Database>, DbError> {
        self.db(DEFAULT_DATABASE_KEY)
    }

    /// Registers an open connection; an earlier one for the same key wins.
    pub fn attach_database(&self, database: Database) -> Rc<Database> {
        self.databases.attach(database)
    }

    /// Outbound HTTP client.
    #[must_use]
    pub fn http(&self) -> HttpClient {
        HttpClient::new()
    }

    /// Installs the global tracing subscriber with the file sink.
    ///
    /// # Errors
    ///
    /// See [`telemetry::initialise`].
    pub fn install_telemetry(&self) -> Result<TelemetryHandle, TelemetryError> {
        telemetry::initialise(&self.settings, &self.logger)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn settings_for(dir: &TempDir) -> Settings {
        Settings {
            app_dir: Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path"),
            ..Settings::default()
        }
    }

    #[rstest]
    fn bootstrap_prepares_directories_and_loads_config() {
        let dir = TempDir::new().expect("temp dir");
        let settings = settings_for(&dir);
        let config_dir = settings.paths().config_dir().to_owned();
        fs::create_dir_all(&config_dir).expect("config dir");
        fs::write(config_dir.join("config.toml"), "name = \"demo\"\n").expect("config");

        let app = App::bootstrap(settings).expect("bootstrap");
        assert_eq!(app.config().get_str("name"), Some("demo"));
        assert!(app.paths().logs_dir().is_dir());
        assert_eq!(app.logger().logs_dir(), app.paths().logs_dir());
    }

    #[rstest]
    fn bootstrap_requires_environment_file() {
        let dir = TempDir::new().expect("temp dir");
        let err = App::bootstrap(settings_for(&dir)).expect_err("missing config");
        assert!(err.to_string().starts_with("unable to find config file -> "));
    }

    #[rstest]
    fn database_connections_are_memoised_per_key() {
        let dir = TempDir::new().expect("temp dir");
        let config = ConfigStore::from_value(json!({"database": {"db": ":memory:"}}));
        let app = App::with_config(settings_for(&dir), config);

        let first = app.database().expect("open");
        let second = app.db("database").expect("reuse");
        assert!(Rc::ptr_eq(&first, &second));

        let err = app.db("reporting").expect_err("missing section");
        assert_eq!(err.to_string(), "database config reporting is not found");
    }
}

//! Derives the directory layout of a Kore application.
//!
//! Every binary and handler must agree on where configuration, views, lock
//! markers and log files live, so the layout is computed in one place from
//! the application directory.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Canonical paths for the artefacts of one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    app_dir: Utf8PathBuf,
    config_dir: Utf8PathBuf,
    views_dir: Utf8PathBuf,
    tmp_dir: Utf8PathBuf,
    logs_dir: Utf8PathBuf,
}

impl AppPaths {
    /// Derives the layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        let app_dir: Utf8PathBuf = root.into();
        let tmp_dir = app_dir.join("tmp");
        Self {
            config_dir: app_dir.join("config"),
            views_dir: app_dir.join("views"),
            logs_dir: tmp_dir.join("logs"),
            tmp_dir,
            app_dir,
        }
    }

    /// Creates the writable directories (`tmp` and `tmp/logs`).
    ///
    /// # Errors
    ///
    /// Returns [`AppPathsError::CreateDirectory`] when a directory cannot be
    /// created.
    pub fn prepare(&self) -> Result<(), AppPathsError> {
        for dir in [&self.tmp_dir, &self.logs_dir] {
            fs::create_dir_all(dir).map_err(|source| AppPathsError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Root directory of the application.
    #[must_use]
    pub fn app_dir(&self) -> &Utf8Path {
        &self.app_dir
    }

    /// Directory holding the configuration files.
    #[must_use]
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Directory holding view templates.
    #[must_use]
    pub fn views_dir(&self) -> &Utf8Path {
        &self.views_dir
    }

    /// Directory holding lock markers.
    #[must_use]
    pub fn tmp_dir(&self) -> &Utf8Path {
        &self.tmp_dir
    }

    /// Directory holding date-stamped log files.
    #[must_use]
    pub fn logs_dir(&self) -> &Utf8Path {
        &self.logs_dir
    }

    /// Configuration file for `env`, or `config.toml` when no environment
    /// is selected.
    #[must_use]
    pub fn config_file(&self, env: Option<&str>) -> Utf8PathBuf {
        env.map_or_else(
            || self.config_dir.join("config.toml"),
            |name| self.config_dir.join(format!("config-{name}.toml")),
        )
    }

    /// Environment-independent configuration file.
    #[must_use]
    pub fn common_config_file(&self) -> Utf8PathBuf {
        self.config_dir.join("config-common.toml")
    }

    /// Lock marker for the named command.
    #[must_use]
    pub fn lock_file(&self, name: &str) -> Utf8PathBuf {
        self.tmp_dir.join(format!("{name}.lock"))
    }

    /// Log file for `name` on the day rendered as `date` (`YYYY-MM-DD`).
    #[must_use]
    pub fn log_file(&self, name: &str, date: &str) -> Utf8PathBuf {
        self.logs_dir.join(format!("{name}-{date}.log"))
    }

    /// Template file for the named view.
    #[must_use]
    pub fn view_file(&self, name: &str) -> Utf8PathBuf {
        self.views_dir.join(format!("{name}.html"))
    }
}

/// Errors raised while preparing the application layout.
#[derive(Debug, Error)]
pub enum AppPathsError {
    /// Creating a writable directory failed.
    #[error("failed to prepare directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_layout_from_app_dir() {
        let paths = AppPaths::new("/srv/app");
        assert_eq!(paths.config_dir().as_str(), "/srv/app/config");
        assert_eq!(paths.views_dir().as_str(), "/srv/app/views");
        assert_eq!(paths.tmp_dir().as_str(), "/srv/app/tmp");
        assert_eq!(paths.logs_dir().as_str(), "/srv/app/tmp/logs");
    }

    #[test]
    fn names_per_environment_files() {
        let paths = AppPaths::new("/srv/app");
        assert_eq!(paths.config_file(None).as_str(), "/srv/app/config/config.toml");
        assert_eq!(
            paths.config_file(Some("test")).as_str(),
            "/srv/app/config/config-test.toml"
        );
        assert_eq!(
            paths.common_config_file().as_str(),
            "/srv/app/config/config-common.toml"
        );
    }

    #[test]
    fn names_lock_and_log_files() {
        let paths = AppPaths::new("/srv/app");
        assert_eq!(paths.lock_file("sync").as_str(), "/srv/app/tmp/sync.lock");
        assert_eq!(
            paths.log_file("app", "2024-01-31").as_str(),
            "/srv/app/tmp/logs/app-2024-01-31.log"
        );
    }

    #[test]
    fn prepare_creates_writable_directories() {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 path");
        let paths = AppPaths::new(root);
        paths.prepare().expect("prepare layout");
        assert!(paths.tmp_dir().is_dir());
        assert!(paths.logs_dir().is_dir());
    }
}

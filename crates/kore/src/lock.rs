//! File-based mutual exclusion for command runs.
//!
//! A marker `<tmp>/<command>.lock` whose age, in whole seconds, is at most
//! the lock window means another run of the command is in progress. Fresh markers are created
//! atomically with `create_new`. Taking over a stale marker rewrites its mtime
//! after the age check, so two processes racing on the same stale marker can
//! both proceed.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::process;
use std::time::{Duration, SystemTime};

use camino::{Utf8Path, Utf8PathBuf};
use filetime::FileTime;
use thiserror::Error;
use tracing::{debug, warn};

const LOCK_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lock");

/// Marker guarding one command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLock {
    path: Utf8PathBuf,
    window: Duration,
}

/// Observed state of a lock marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No marker exists.
    Free,
    /// A marker exists but its whole-second age exceeds the window.
    Stale {
        /// Time since the marker was last touched.
        age: Duration,
    },
    /// A marker exists and its whole-second age is within the window.
    Held {
        /// Time since the marker was last touched.
        age: Duration,
    },
}

/// Result of an acquisition attempt.
#[derive(Debug)]
pub enum Acquisition {
    /// The caller owns the marker until the guard drops.
    Acquired(LockGuard),
    /// Another run holds a fresh marker.
    Held {
        /// Time since the marker was last touched.
        age: Duration,
    },
}

impl CommandLock {
    /// Creates a lock at `path` that stays fresh for `window`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, window: Duration) -> Self {
        Self {
            path: path.into(),
            window,
        }
    }

    /// Marker location.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Freshness window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Inspects the marker without changing it.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Inspect`] when the marker metadata is unreadable.
    pub fn state(&self) -> Result<LockState, LockError> {
        match fs::metadata(&self.path) {
            Ok(metadata) => {
                let modified = metadata.modified().map_err(|source| self.inspect(source))?;
                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or(Duration::ZERO);
                // Whole seconds, inclusive: a zero window still holds for
                // the rest of the second the marker was touched in.
                if Duration::from_secs(age.as_secs()) <= self.window {
                    Ok(LockState::Held { age })
                } else {
                    Ok(LockState::Stale { age })
                }
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(LockState::Free),
            Err(source) => Err(self.inspect(source)),
        }
    }

    /// Returns true when a fresh marker exists.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Inspect`] when the marker metadata is unreadable.
    pub fn is_locked(&self) -> Result<bool, LockError> {
        Ok(matches!(self.state()?, LockState::Held { .. }))
    }

    /// Takes the marker unless a fresh one exists.
    ///
    /// # Errors
    ///
    /// Returns [`LockError`] when the marker cannot be created, inspected or
    /// refreshed.
    pub fn acquire(&self) -> Result<Acquisition, LockError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| LockError::Create {
                path: self.path.clone(),
                source,
            })?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        match options.open(&self.path) {
            Ok(mut file) => {
                // The pid is informational only; freshness is the mtime.
                if let Err(error) = writeln!(file, "{}", process::id()) {
                    debug!(target: LOCK_TARGET, file = %self.path, %error, "could not record pid in lock");
                }
                debug!(target: LOCK_TARGET, file = %self.path, "acquired command lock");
                Ok(Acquisition::Acquired(LockGuard::new(self.path.clone())))
            }
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => self.take_existing(),
            Err(source) => Err(LockError::Create {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn take_existing(&self) -> Result<Acquisition, LockError> {
        match self.state()? {
            LockState::Held { age } => Ok(Acquisition::Held { age }),
            LockState::Stale { age } => {
                warn!(
                    target: LOCK_TARGET,
                    file = %self.path,
                    age_secs = age.as_secs(),
                    "taking over stale command lock"
                );
                filetime::set_file_mtime(&self.path, FileTime::now()).map_err(|source| {
                    LockError::Refresh {
                        path: self.path.clone(),
                        source,
                    }
                })?;
                Ok(Acquisition::Acquired(LockGuard::new(self.path.clone())))
            }
            // Removed between the create attempt and the inspection.
            LockState::Free => self.acquire(),
        }
    }

    fn inspect(&self, source: io::Error) -> LockError {
        LockError::Inspect {
            path: self.path.clone(),
            source,
        }
    }
}

/// Owns a lock marker and removes it when dropped, including during unwinding.
#[derive(Debug)]
pub struct LockGuard {
    path: Utf8PathBuf,
}

impl LockGuard {
    const fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    /// Marker owned by this guard.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => {
                warn!(
                    target: LOCK_TARGET,
                    file = %self.path,
                    error = %error,
                    "failed to remove lock file"
                );
            }
            _ => {}
        }
    }
}

/// Errors raised while managing lock markers.
#[derive(Debug, Error)]
pub enum LockError {
    /// The marker could not be created.
    #[error("failed to create lock file '{path}': {source}")]
    Create {
        /// Marker path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The marker metadata could not be read.
    #[error("failed to inspect lock file '{path}': {source}")]
    Inspect {
        /// Marker path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A stale marker could not be refreshed.
    #[error("failed to refresh lock file '{path}': {source}")]
    Refresh {
        /// Marker path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    struct Scratch {
        _temp: TempDir,
        path: Utf8PathBuf,
    }

    #[fixture]
    fn scratch() -> Scratch {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(temp.path().join("tmp").join("sync.lock"))
            .expect("utf8 path");
        Scratch { _temp: temp, path }
    }

    fn age_marker(path: &Utf8Path, secs: i64) {
        let past = FileTime::from_unix_time(FileTime::now().unix_seconds() - secs, 0);
        filetime::set_file_mtime(path, past).expect("age marker");
    }

    #[rstest]
    fn acquires_free_lock_and_releases_on_drop(scratch: Scratch) {
        let lock = CommandLock::new(scratch.path.clone(), Duration::from_secs(60));
        assert_eq!(lock.state().expect("state"), LockState::Free);
        match lock.acquire().expect("acquire") {
            Acquisition::Acquired(guard) => {
                assert!(guard.path().exists());
                assert!(lock.is_locked().expect("state"));
                drop(guard);
            }
            Acquisition::Held { .. } => panic!("free lock must be acquired"),
        }
        assert!(!scratch.path.exists());
    }

    #[rstest]
    fn fresh_marker_blocks_second_run(scratch: Scratch) {
        let lock = CommandLock::new(scratch.path.clone(), Duration::from_secs(60));
        let Acquisition::Acquired(_guard) = lock.acquire().expect("first acquire") else {
            panic!("first acquire must succeed");
        };
        assert!(matches!(
            lock.acquire().expect("second acquire"),
            Acquisition::Held { .. }
        ));
    }

    #[rstest]
    fn stale_marker_is_taken_over(scratch: Scratch) {
        let lock = CommandLock::new(scratch.path.clone(), Duration::from_secs(60));
        fs::create_dir_all(scratch.path.parent().expect("parent")).expect("tmp dir");
        fs::write(&scratch.path, "1\n").expect("marker");
        age_marker(&scratch.path, 600);
        assert!(matches!(lock.state().expect("state"), LockState::Stale { .. }));

        let Acquisition::Acquired(guard) = lock.acquire().expect("acquire") else {
            panic!("stale lock must be taken over");
        };
        assert!(lock.is_locked().expect("refreshed marker is fresh"));
        drop(guard);
        assert!(!scratch.path.exists());
    }

    #[rstest]
    fn zero_window_blocks_within_the_same_second(scratch: Scratch) {
        let lock = CommandLock::new(scratch.path.clone(), Duration::ZERO);
        let Acquisition::Acquired(_first) = lock.acquire().expect("first") else {
            panic!("first acquire must succeed");
        };
        assert!(matches!(
            lock.acquire().expect("second"),
            Acquisition::Held { .. }
        ));
    }

    #[rstest]
    fn marker_exactly_one_window_old_still_blocks(scratch: Scratch) {
        let lock = CommandLock::new(scratch.path.clone(), Duration::from_secs(5));
        fs::create_dir_all(scratch.path.parent().expect("parent")).expect("tmp dir");
        fs::write(&scratch.path, "1\n").expect("marker");
        age_marker(&scratch.path, 5);
        assert!(matches!(lock.state().expect("state"), LockState::Held { .. }));

        age_marker(&scratch.path, 7);
        assert!(matches!(lock.state().expect("state"), LockState::Stale { .. }));
    }
}

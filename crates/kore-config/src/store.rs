//! Read-only application configuration addressed by dotted keys.
//!
//! The store is built once from `config.toml` (or `config-<env>.toml`) and the
//! optional `config-common.toml`. Top-level keys of the common file replace the
//! same keys of the environment file.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::paths::AppPaths;

/// Nested configuration mapping loaded at process start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    values: Map<String, Value>,
}

impl ConfigStore {
    /// Loads the configuration for `env` from the layout in `paths`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::NotFound`] when the environment file is
    /// missing, or a read/parse error for either file.
    pub fn load(paths: &AppPaths, env: Option<&str>) -> Result<Self, ConfigStoreError> {
        let primary = paths.config_file(env);
        let Some(mut values) = read_table(&primary)? else {
            return Err(ConfigStoreError::NotFound { path: primary });
        };

        if let Some(common) = read_table(&paths.common_config_file())? {
            values.extend(common);
        }
        Ok(Self { values })
    }

    /// Builds a store from an in-memory JSON value. Non-object values yield an
    /// empty store.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    /// Looks up a dotted key such as `db.path`. Null values count as missing.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let first = parts.next()?;
        let mut current = self.values.get(first)?;
        for part in parts {
            current = step(current, part)?;
        }
        (!current.is_null()).then_some(current)
    }

    /// Looks up a dotted key, falling back to `default`.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Looks up a dotted key holding a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Deserializes the value at a dotted key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Shape`] when the value does not match `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigStoreError> {
        self.get(key)
            .map(|value| {
                T::deserialize(value).map_err(|source| ConfigStoreError::Shape {
                    key: key.to_owned(),
                    source,
                })
            })
            .transpose()
    }

    /// The whole top-level mapping.
    #[must_use]
    pub const fn all(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// Walks a dotted key through nested objects and arrays of `value`.
///
/// An empty key returns `value` itself.
#[must_use]
pub fn lookup_dotted<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return Some(value);
    }
    key.split('.').try_fold(value, step)
}

fn step<'a>(value: &'a Value, part: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn read_table(path: &Utf8Path) -> Result<Option<Map<String, Value>>, ConfigStoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigStoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str::<Map<String, Value>>(&text)
        .map(Some)
        .map_err(|source| ConfigStoreError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
}

/// Errors raised while loading or reading the configuration store.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// The environment configuration file does not exist.
    #[error("unable to find config file -> {path}")]
    NotFound {
        /// Expected location of the file.
        path: Utf8PathBuf,
    },
    /// A configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A configuration file is not valid TOML.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the malformed file.
        path: Utf8PathBuf,
        /// Underlying TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },
    /// A value does not have the requested shape.
    #[error("config key '{key}' has an unexpected shape: {source}")]
    Shape {
        /// Dotted key that was requested.
        key: String,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    struct Layout {
        _temp: TempDir,
        paths: AppPaths,
    }

    #[fixture]
    fn layout() -> Layout {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 path");
        let paths = AppPaths::new(root);
        fs::create_dir_all(paths.config_dir()).expect("config dir");
        Layout { _temp: temp, paths }
    }

    fn write(path: &Utf8Path, contents: &str) {
        fs::write(path, contents).expect("write config");
    }

    #[test]
    fn dotted_keys_walk_nested_tables() {
        let store = ConfigStore::from_value(json!({"a": {"b": {"c": "v"}}}));
        assert_eq!(store.get("a.b.c"), Some(&json!("v")));
        assert_eq!(store.get("a.b.x"), None);
        assert_eq!(store.get_or("a.b.x", json!("fallback")), json!("fallback"));
        assert_eq!(store.get_str("a.b.c"), Some("v"));
    }

    #[test]
    fn null_values_count_as_missing() {
        let store = ConfigStore::from_value(json!({"a": null}));
        assert_eq!(store.get_or("a", json!(3)), json!(3));
    }

    #[test]
    fn array_segments_index_into_lists() {
        let value = json!({"hosts": ["one", "two"]});
        assert_eq!(lookup_dotted(&value, "hosts.1"), Some(&json!("two")));
        assert_eq!(lookup_dotted(&value, "hosts.9"), None);
        assert_eq!(lookup_dotted(&value, ""), Some(&value));
    }

    #[test]
    fn get_as_decodes_sections() {
        #[derive(serde::Deserialize)]
        struct Section {
            port: u16,
        }
        let store = ConfigStore::from_value(json!({"srv": {"port": 8080}}));
        let section: Section = store
            .get_as("srv")
            .expect("decode section")
            .expect("section present");
        assert_eq!(section.port, 8080);
        assert!(store.get_as::<Section>("nope").expect("absent").is_none());
    }

    #[rstest]
    fn missing_environment_file_names_expected_path(layout: Layout) {
        let err = ConfigStore::load(&layout.paths, Some("prod")).expect_err("must fail");
        assert_eq!(
            err.to_string(),
            format!(
                "unable to find config file -> {}",
                layout.paths.config_file(Some("prod"))
            )
        );
    }

    #[rstest]
    fn common_file_replaces_top_level_keys(layout: Layout) {
        write(
            &layout.paths.config_file(Some("test")),
            "name = \"env\"\n[db]\ndb = \"env.sqlite\"\nport = 1\n",
        );
        write(
            &layout.paths.common_config_file(),
            "[db]\ndb = \"common.sqlite\"\n",
        );
        let store = ConfigStore::load(&layout.paths, Some("test")).expect("load store");
        assert_eq!(store.get_str("name"), Some("env"));
        assert_eq!(store.get_str("db.db"), Some("common.sqlite"));
        assert_eq!(store.get("db.port"), None);
    }

    #[rstest]
    fn malformed_files_report_parse_errors(layout: Layout) {
        write(&layout.paths.config_file(None), "= broken");
        let err = ConfigStore::load(&layout.paths, None).expect_err("must fail");
        assert!(matches!(err, ConfigStoreError::Parse { .. }));
    }
}

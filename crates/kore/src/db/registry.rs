//! Memoised connections keyed by configuration key.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use camino::Utf8Path;
use kore_config::ConfigStore;

use super::{Database, DatabaseConfig, DbError};

/// One memoised connection per configuration key.
///
/// The first connection registered for a key is kept for the life of the
/// registry; later requests for the key return it.
#[derive(Debug, Default)]
pub struct Databases {
    connections: RefCell<HashMap<String, Rc<Database>>>,
}

impl Databases {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the connection for `key`, opening it from `config` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingConfig`] when `config` has no section for
    /// `key`, [`DbError::InvalidConfig`] when the section is malformed, or
    /// [`DbError::Open`] when the database cannot be opened.
    pub fn connection(
        &self,
        key: &str,
        config: &ConfigStore,
        app_dir: &Utf8Path,
    ) -> Result<Rc<Database>, DbError> {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }

        let section = config
            .get_as::<DatabaseConfig>(key)
            .map_err(|source| DbError::InvalidConfig {
                key: key.to_owned(),
                source,
            })?
            .ok_or_else(|| DbError::MissingConfig {
                key: key.to_owned(),
            })?;
        let database = Database::open(key, &section, app_dir)?;
        Ok(self.attach(database))
    }

    /// Registers an already open connection under its key.
    ///
    /// When the key is taken the existing connection wins and is returned.
    pub fn attach(&self, database: Database) -> Rc<Database> {
        let mut connections = self.connections.borrow_mut();
        Rc::clone(
            connections
                .entry(database.key().to_owned())
                .or_insert_with(|| Rc::new(database)),
        )
    }

    /// Connection registered for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Rc<Database>> {
        self.connections.borrow().get(key).map(Rc::clone)
    }

    /// Number of open connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.borrow().len()
    }

    /// Returns true when no connection is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.borrow().is_empty()
    }
}

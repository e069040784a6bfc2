//! Parameterised statements over an embedded SQLite connection.
//!
//! Every statement goes through one path: prepare, bind each `:name`
//! parameter by kind, execute, then log the elapsed seconds and a display-only
//! rendering of the statement at DEBUG.

mod errors;
mod registry;
mod value;

use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::{Connection, Statement};
use serde::Deserialize;
use tracing::{debug, error};

pub use errors::DbError;
pub use registry::Databases;
pub use value::{Params, Row, Value};

const DB_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::db");

/// Configuration key used when none is given.
pub const DEFAULT_DATABASE_KEY: &str = "database";

/// Path that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Configuration section describing one database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Database file, relative to the application directory, or `:memory:`.
    pub db: String,
}

/// One open connection, owned by the registry and shared by reference.
#[derive(Debug)]
pub struct Database {
    key: String,
    conn: Connection,
}

impl Database {
    /// Opens the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Open`] when the file cannot be opened.
    pub fn open(key: &str, config: &DatabaseConfig, app_dir: &Utf8Path) -> Result<Self, DbError> {
        if config.db == IN_MEMORY {
            return Self::open_in_memory(key);
        }
        let path = resolve(app_dir, &config.db);
        let conn = Connection::open(&path).map_err(|source| DbError::Open {
            path: path.clone(),
            source,
        })?;
        debug!(target: DB_TARGET, key, file = %path, "opened database");
        Ok(Self {
            key: key.to_owned(),
            conn,
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Open`] when SQLite cannot allocate the database.
    pub fn open_in_memory(key: &str) -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|source| DbError::Open {
            path: Utf8PathBuf::from(IN_MEMORY),
            source,
        })?;
        Ok(Self {
            key: key.to_owned(),
            conn,
        })
    }

    /// Configuration key this connection was opened for.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying driver connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs a query and returns every row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when preparation, binding or execution fails.
    pub fn select(&self, query: &str, params: &Params) -> Result<Vec<Row>, DbError> {
        self.execute(query, params, |stmt| collect_rows(stmt, usize::MAX))
    }

    /// Runs a query and returns the first row, or an empty row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when preparation, binding or execution fails.
    pub fn select_first(&self, query: &str, params: &Params) -> Result<Row, DbError> {
        let rows = self.execute(query, params, |stmt| collect_rows(stmt, 1))?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    /// Runs a query and returns the first column of the first row, or `0`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when preparation, binding or execution fails.
    pub fn count(&self, query: &str, params: &Params) -> Result<Value, DbError> {
        self.execute(query, params, |stmt| {
            let mut rows = stmt.raw_query();
            let Some(row) = rows.next()? else {
                return Ok(Value::Integer(0));
            };
            Ok(Value::from(row.get_ref(0)?))
        })
    }

    /// Runs an insert and returns the last generated row id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when preparation, binding or execution fails.
    pub fn insert(&self, query: &str, params: &Params) -> Result<i64, DbError> {
        self.execute(query, params, |stmt| stmt.raw_execute())?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Runs an update and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when preparation, binding or execution fails.
    pub fn update(&self, query: &str, params: &Params) -> Result<usize, DbError> {
        self.execute(query, params, |stmt| stmt.raw_execute())
    }

    /// Runs a delete and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when preparation, binding or execution fails.
    pub fn delete(&self, query: &str, params: &Params) -> Result<usize, DbError> {
        self.execute(query, params, |stmt| stmt.raw_execute())
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Driver`] when a transaction is already open.
    pub fn begin_transaction(&self) -> Result<(), DbError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Driver`] when no transaction is open or the commit
    /// fails.
    pub fn commit(&self) -> Result<(), DbError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Driver`] when no transaction is open.
    pub fn rollback(&self) -> Result<(), DbError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    /// Runs `work` inside a transaction.
    ///
    /// Commits when `work` succeeds. When `work` or the commit fails, the
    /// failure is logged, the transaction is rolled back and
    /// [`DbError::RolledBack`] carries the reason.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::RolledBack`] after a rollback, or the driver error
    /// when the transaction cannot be started or rolled back.
    pub fn transaction<T, F>(&self, work: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> anyhow::Result<T>,
    {
        self.begin_transaction()?;
        let failure = match work(self) {
            Ok(value) => match self.commit() {
                Ok(()) => return Ok(value),
                Err(commit) => anyhow::Error::new(commit),
            },
            Err(failure) => failure,
        };

        let reason = format!("{failure:#}");
        error!(target: DB_TARGET, key = %self.key, "{reason}");
        self.rollback()?;
        Err(DbError::RolledBack { reason })
    }

    /// Builds an `IN (...)` clause with one synthetic parameter per value.
    ///
    /// `in_clause("m", [1, 2])` yields `IN (:m_0, :m_1)` with `m_0 = 1` and
    /// `m_1 = 2`.
    #[must_use]
    pub fn in_clause<V, I>(marker: &str, values: I) -> (String, Params)
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let mut params = Params::new();
        let mut placeholders = Vec::new();
        for (index, value) in values.into_iter().enumerate() {
            let name = format!("{marker}_{index}");
            placeholders.push(format!(":{name}"));
            params.insert(name, value);
        }
        (format!("IN ({})", placeholders.join(", ")), params)
    }

    fn execute<T>(
        &self,
        query: &str,
        params: &Params,
        run: impl FnOnce(&mut Statement<'_>) -> rusqlite::Result<T>,
    ) -> Result<T, DbError> {
        let mut stmt = self
            .conn
            .prepare(query)
            .map_err(|source| DbError::statement(query, source))?;
        for (name, value) in params.iter() {
            let index = stmt
                .parameter_index(&format!(":{name}"))?
                .ok_or_else(|| DbError::UnknownParameter {
                    name: name.to_owned(),
                })?;
            stmt.raw_bind_parameter(index, value)?;
        }

        let started = Instant::now();
        let outcome = run(&mut stmt);
        let elapsed = started.elapsed().as_secs_f64();
        debug!(target: DB_TARGET, "{elapsed:.6} - {}", display_statement(query, params));
        outcome.map_err(DbError::from)
    }
}

fn collect_rows(stmt: &mut Statement<'_>, limit: usize) -> rusqlite::Result<Vec<Row>> {
    let names: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
    let mut rows = stmt.raw_query();
    let mut collected = Vec::new();
    while collected.len() < limit {
        let Some(row) = rows.next()? else {
            break;
        };
        let mut record = Row::new();
        for (index, name) in names.iter().enumerate() {
            record.insert(name.clone(), Value::from(row.get_ref(index)?));
        }
        collected.push(record);
    }
    Ok(collected)
}

/// Collapses whitespace and substitutes rendered values for placeholders.
///
/// The result is for log lines only and is never executed.
fn display_statement(query: &str, params: &Params) -> String {
    let mut rendered = query.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut ordered: Vec<(&str, &Value)> = params.iter().collect();
    // Longest names first so `:id` does not clobber `:id_2`.
    ordered.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
    for (name, value) in ordered {
        rendered = rendered.replace(&format!(":{name}"), &value.render());
    }
    rendered
}

fn resolve(app_dir: &Utf8Path, file: &str) -> Utf8PathBuf {
    let path = Utf8Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        app_dir.join(path)
    }
}

//! Kore: a small application framework.
//!
//! Web paths route to [`Controller`]s and argument vectors to [`Command`]s
//! through explicit registries. Both run through a uniform lifecycle that
//! logs start and end lines, captures errors and panics, and hands them to
//! the handler's error hook. Commands additionally hold a file lock for the
//! duration of the run.
//!
//! Handlers reach shared facilities through the [`App`] context:
//!
//! - [`ConfigStore`](kore_config::ConfigStore): dotted-key configuration,
//! - [`Database`]: parameterised SQLite queries, one connection per key,
//! - [`HttpClient`]: one method per HTTP verb,
//! - [`Logger`]: date-stamped log files fed by `tracing` events,
//! - [`Views`]: file-based templates.

mod app;
pub mod db;
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod lock;
pub mod log;
pub mod telemetry;
pub mod web;

pub use app::{App, BootstrapError};
pub use db::{Database, DbError, Params, Row, Value};
pub use dispatch::{
    CommandRegistry, CommandRouter, ControllerRegistry, DispatchError, HandlerId, WebRouter,
};
pub use handler::{Command, CommandContext, CommandOutcome, Controller, ControllerContext};
pub use http::{HttpClient, HttpError, HttpResponse};
pub use kore_config::{LogLevel, Settings};
pub use log::Logger;
pub use web::{Request, Response, Views};

#[cfg(test)]
mod tests;

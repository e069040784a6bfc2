//! Resolution of web paths and argument vectors to registered handlers.
//!
//! Handlers live in explicit registries of factories keyed by identifier:
//! controllers under `controllers::`, commands under `commands::`.
//!
//! ## Web routing
//!
//! The request path loses its query string, is percent-decoded, trimmed of
//! `/` and stripped of the base path. Its segments are tried shortest
//! prefix first:
//!
//! ```text
//! /path1/mock/extra  ->  controllers::path1        (not registered)
//!                        controllers::path1::mock  (registered, args ["extra"])
//! ```
//!
//! An empty path uses the default controller. No match answers 404.
//!
//! ## Command routing
//!
//! `argv[1]` names the command (`db/migrate` becomes `commands::db::migrate`).
//! Later tokens of the form `--key=value` are options; everything else is a
//! positional argument.

mod cli;
mod errors;
mod identifier;
mod registry;
mod web;

pub use cli::{COMMANDS_ROOT, CommandRegistry, CommandRouter, Invocation, classify};
pub use errors::DispatchError;
pub use identifier::{HandlerId, SEPARATOR};
pub use registry::Registry;
pub use web::{CONTROLLERS_ROOT, ControllerRegistry, Resolution, WebRouter};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

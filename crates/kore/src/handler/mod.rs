//! Controller and command traits, their run contexts and the shared
//! lifecycle.
//!
//! A handler implements one required method ([`Controller::action`] or
//! [`Command::exec`]) and overrides hooks as needed. The dispatchers bind a
//! context and call [`run_controller`] or [`run_command`], which log the
//! start and end of the run, catch errors and panics, and route them to the
//! handler's error hook.

mod command;
mod controller;
mod lifecycle;

pub use command::{Command, CommandContext, CommandOutcome};
pub use controller::{Controller, ControllerContext};
pub use lifecycle::{run_command, run_controller};

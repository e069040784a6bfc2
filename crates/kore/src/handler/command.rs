//! The [`Command`] trait and the context a command run sees.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::time::Duration;

use kore_config::LogLevel;

use crate::app::App;
use crate::dispatch::HandlerId;

/// A command-line handler.
///
/// Only [`Command::exec`] is required. The other methods are hooks with
/// framework defaults.
pub trait Command {
    /// Runs the command.
    ///
    /// # Errors
    ///
    /// Any error is logged and passed to [`Command::handle_error`].
    fn exec(&mut self, ctx: &mut CommandContext<'_>) -> anyhow::Result<()>;

    /// Runs before [`Command::exec`].
    ///
    /// # Errors
    ///
    /// An error skips the body and reaches [`Command::handle_error`].
    fn pre_exec(&mut self, _ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Name used for the log file and the lock marker. Defaults to the last
    /// identifier segment.
    fn command_name(&self, identifier: &HandlerId) -> String {
        identifier.leaf().to_owned()
    }

    /// Minimum severity written while this command runs.
    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    /// How long a lock marker stays fresh. `None` uses the configured window.
    fn lock_window(&self) -> Option<Duration> {
        None
    }

    /// Handles an error raised by the pre-hook or the body.
    ///
    /// # Errors
    ///
    /// The default returns `error`, so the run fails.
    fn handle_error(
        &mut self,
        _ctx: &mut CommandContext<'_>,
        error: anyhow::Error,
    ) -> anyhow::Result<()> {
        Err(error)
    }
}

/// How a command run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The body ran, or its error was handled.
    Completed,
    /// A fresh lock marker was found, so the body did not run.
    Skipped {
        /// Age of the marker.
        age: Duration,
    },
}

/// Arguments, options and output for one command run.
pub struct CommandContext<'a> {
    app: &'a App,
    identifier: HandlerId,
    args: Vec<String>,
    opts: BTreeMap<String, String>,
    out: &'a mut dyn Write,
}

impl<'a> CommandContext<'a> {
    /// Binds a resolved command to its arguments and output stream.
    #[must_use]
    pub const fn new(
        app: &'a App,
        identifier: HandlerId,
        args: Vec<String>,
        opts: BTreeMap<String, String>,
        out: &'a mut dyn Write,
    ) -> Self {
        Self {
            app,
            identifier,
            args,
            opts,
            out,
        }
    }

    /// Application context.
    #[must_use]
    pub const fn app(&self) -> &'a App {
        self.app
    }

    /// Resolved command identifier.
    #[must_use]
    pub const fn identifier(&self) -> &HandlerId {
        &self.identifier
    }

    /// Positional argument at `index`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Positional argument at `index`, or `default`.
    #[must_use]
    pub fn arg_or<'s>(&'s self, index: usize, default: &'s str) -> &'s str {
        self.arg(index).unwrap_or(default)
    }

    /// Positional arguments in input order.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Option `key` from a `--key=value` token.
    #[must_use]
    pub fn opt(&self, key: &str) -> Option<&str> {
        self.opts.get(key).map(String::as_str)
    }

    /// Option `key`, or `default`.
    #[must_use]
    pub fn opt_or<'s>(&'s self, key: &str, default: &'s str) -> &'s str {
        self.opt(key).unwrap_or(default)
    }

    /// All options.
    #[must_use]
    pub const fn opts(&self) -> &BTreeMap<String, String> {
        &self.opts
    }

    /// Standard output of the run.
    pub const fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("identifier", &self.identifier)
            .field("args", &self.args)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

//! Command-line routing: argument vectors to commands.

use std::collections::BTreeMap;
use std::io::Write;

use tracing::debug;

use super::identifier::{HandlerId, SEPARATOR};
use super::registry::Registry;
use super::{DISPATCH_TARGET, DispatchError};
use crate::app::App;
use crate::handler::{Command, CommandContext, CommandOutcome, run_command};

/// Namespace root for commands.
pub const COMMANDS_ROOT: &str = "commands";

/// Command factories keyed under [`COMMANDS_ROOT`].
pub type CommandRegistry = Registry<dyn Command>;

/// A resolved command with its classified tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Matched command.
    pub identifier: HandlerId,
    /// Positional arguments in input order.
    pub args: Vec<String>,
    /// `--key=value` options; the last occurrence of a key wins.
    pub opts: BTreeMap<String, String>,
}

/// Routes argument vectors to commands.
///
/// `argv[0]` is the program name and `argv[1]` the command token, where
/// `/` separates namespace segments (`db/migrate`).
#[derive(Debug)]
pub struct CommandRouter {
    commands: CommandRegistry,
}

impl CommandRouter {
    /// Router over `commands`.
    #[must_use]
    pub const fn new(commands: CommandRegistry) -> Self {
        Self { commands }
    }

    /// Registered commands.
    #[must_use]
    pub const fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Resolves the command token and classifies the remaining tokens.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingCommand`] when `argv` has no command
    /// token and [`DispatchError::CommandNotFound`] when the token names no
    /// registered command.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S]) -> Result<Invocation, DispatchError> {
        let mut tokens = argv.iter().map(|arg| arg.as_ref()).skip(1);
        let command = tokens.next().ok_or(DispatchError::MissingCommand)?;
        let identifier = HandlerId::new(self.commands.root(), &command.replace('/', SEPARATOR));
        if !self.commands.contains(&identifier) {
            return Err(DispatchError::command_not_found(identifier.as_str()));
        }
        let (args, opts) = classify(tokens);
        Ok(Invocation {
            identifier,
            args,
            opts,
        })
    }

    /// Resolves and runs the command named by `argv`, writing its output to
    /// `out`.
    ///
    /// # Errors
    ///
    /// Returns the [`CommandRouter::parse`] errors, plus the lock and
    /// handler failures reported by [`run_command`].
    pub fn dispatch<S: AsRef<str>>(
        &self,
        app: &App,
        argv: &[S],
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, DispatchError> {
        let invocation = self.parse(argv)?;
        let mut command = self
            .commands
            .build(&invocation.identifier)
            .ok_or_else(|| DispatchError::command_not_found(invocation.identifier.as_str()))?;
        debug!(
            target: DISPATCH_TARGET,
            command = invocation.identifier.as_str(),
            args = ?invocation.args,
            opts = ?invocation.opts,
            "routing command"
        );
        let mut ctx = CommandContext::new(
            app,
            invocation.identifier,
            invocation.args,
            invocation.opts,
            out,
        );
        run_command(command.as_mut(), &mut ctx)
    }
}

/// Splits tokens into positional arguments and `--key=value` options.
///
/// Only tokens whose key and value are both non-empty ASCII alphanumerics
/// count as options; anything else stays positional.
#[must_use]
pub fn classify<'t, I>(tokens: I) -> (Vec<String>, BTreeMap<String, String>)
where
    I: IntoIterator<Item = &'t str>,
{
    let mut args = Vec::new();
    let mut opts = BTreeMap::new();
    for token in tokens {
        let Some((key, value)) = parse_option(token) else {
            args.push(token.to_owned());
            continue;
        };
        opts.insert(key.to_owned(), value.to_owned());
    }
    (args, opts)
}

fn parse_option(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.strip_prefix("--")?.split_once('=')?;
    let alphanumeric =
        |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());
    (alphanumeric(key) && alphanumeric(value)).then_some((key, value))
}

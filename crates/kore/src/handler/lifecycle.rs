//! Uniform run sequence shared by controllers and commands.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use anyhow::anyhow;
use tracing::{debug, error, info, warn};

use super::{Command, CommandContext, CommandOutcome, Controller, ControllerContext};
use crate::dispatch::DispatchError;
use crate::lock::{Acquisition, CommandLock};

const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handler");

/// Runs a controller: logger init, start line, pre-hook and action, error
/// hook on failure, end line.
///
/// Errors and panics from the pre-hook or the action never escape; they end
/// up in the response through [`Controller::handle_error`].
pub fn run_controller(controller: &mut dyn Controller, ctx: &mut ControllerContext<'_>) {
    let app = ctx.app();
    app.logger()
        .init(controller.module_name(), controller.log_level());
    let method = ctx.method();
    let identifier = ctx.identifier().clone();

    info!(target: HANDLER_TARGET, "[START][{method}]{identifier}");
    let outcome = guarded(|| {
        controller.pre_action(ctx)?;
        controller.action(ctx)
    });
    if let Err(failure) = outcome {
        error!(target: HANDLER_TARGET, "{failure:#}");
        controller.handle_error(ctx, &failure);
    }
    info!(target: HANDLER_TARGET, "[END][{method}]{identifier}");
}

/// Runs a command: logger init, lock acquisition, start line, pre-hook and
/// body, error hook on failure, end line, lock release.
///
/// # Errors
///
/// Returns [`DispatchError::Lock`] when the marker cannot be handled and
/// [`DispatchError::Handler`] when the error hook propagates a failure.
pub fn run_command(
    command: &mut dyn Command,
    ctx: &mut CommandContext<'_>,
) -> Result<CommandOutcome, DispatchError> {
    let app = ctx.app();
    let identifier = ctx.identifier().clone();
    let name = command.command_name(&identifier);
    app.logger().init(&name, command.log_level());

    let window = command
        .lock_window()
        .unwrap_or_else(|| app.settings().lock_duration());
    let lock = CommandLock::new(app.paths().lock_file(&name), window);
    let guard = match lock.acquire()? {
        Acquisition::Acquired(guard) => guard,
        Acquisition::Held { age } => {
            warn!(target: HANDLER_TARGET, "Process is running!");
            return Ok(CommandOutcome::Skipped { age });
        }
    };

    debug!(target: HANDLER_TARGET, "[START]{identifier}");
    let outcome = guarded(|| {
        command.pre_exec(ctx)?;
        command.exec(ctx)
    });
    let result = match outcome {
        Ok(()) => Ok(()),
        Err(failure) => {
            error!(target: HANDLER_TARGET, "{failure:#}");
            command.handle_error(ctx, failure)
        }
    };
    debug!(target: HANDLER_TARGET, "[END]{identifier}");
    drop(guard);

    result
        .map(|()| CommandOutcome::Completed)
        .map_err(|source| DispatchError::handler(identifier.as_str(), source))
}

/// Runs `body`, turning a panic into an error.
fn guarded<F>(body: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    panic::catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|payload| Err(anyhow!("panicked: {}", panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

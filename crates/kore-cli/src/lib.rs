//! Runtime behind the `kore` and `kore-cgi` binaries.
//!
//! Both entry points share the same bootstrap: framework flags are peeled
//! off the argument list, settings are layered, the application context is
//! built and telemetry installed. `kore` then hands the remaining command
//! line to the command router; `kore-cgi` builds a request from the CGI
//! environment and writes the routed response back to stdout.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::ExitCode;

use kore::{App, CommandOutcome, CommandRouter, Request, Response, WebRouter};
use tracing::{info, warn};

mod config;
mod errors;
pub mod handlers;

use config::{EnvSettingsLoader, SettingsLoader, command_arguments, split_settings_arguments};
pub use errors::AppError;

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cli");

/// Runs a command line and reports the outcome as an exit code.
///
/// Command output goes to `stdout`; failures are described on `stderr`.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    match run_command_line(&arguments, &EnvSettingsLoader, stdout) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => report(stderr, &error),
    }
}

fn run_command_line<W: Write>(
    args: &[OsString],
    loader: &dyn SettingsLoader,
    stdout: &mut W,
) -> Result<CommandOutcome, AppError> {
    let split = split_settings_arguments(args);
    let settings = loader.load(&split.settings_arguments)?;
    let app = App::bootstrap(settings)?;
    app.install_telemetry()?;

    let argv = command_arguments(args, &split)?;
    let outcome = CommandRouter::new(handlers::commands()).dispatch(&app, &argv, stdout)?;
    if let CommandOutcome::Skipped { age } = outcome {
        info!(
            target: CLI_TARGET,
            age_secs = age.as_secs(),
            "command skipped while another run holds the lock"
        );
    }
    Ok(outcome)
}

/// Serves one CGI request read from the environment and `stdin`.
///
/// A response is always written to `stdout`. Failures raised before routing
/// produce a bare 500 and are described on `stderr`.
pub fn run_cgi<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    let outcome = serve_request(&arguments, &EnvSettingsLoader, stdin).and_then(|response| {
        response
            .write_cgi(stdout)
            .map_err(AppError::WriteResponse)
    });
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let fallback = Response::with_status(500);
            if let Err(write_error) = fallback.write_cgi(stdout) {
                warn!(target: CLI_TARGET, error = %write_error, "fallback response lost");
            }
            report(stderr, &error)
        }
    }
}

fn serve_request<R: Read>(
    args: &[OsString],
    loader: &dyn SettingsLoader,
    stdin: R,
) -> Result<Response, AppError> {
    let settings = loader.load(args)?;
    let app = App::bootstrap(settings)?;
    app.install_telemetry()?;

    let request = Request::from_cgi_env(stdin).map_err(AppError::ReadRequest)?;
    let router = WebRouter::from_settings(handlers::controllers(), app.settings())
        .with_not_found(|unmatched| {
            warn!(
                target: CLI_TARGET,
                method = unmatched.method(),
                uri = unmatched.uri(),
                "no controller matched"
            );
        });
    Ok(router.dispatch(&app, &request))
}

fn report<E: Write>(stderr: &mut E, error: &AppError) -> ExitCode {
    if let Err(write_error) = writeln!(stderr, "kore: {error}") {
        warn!(target: CLI_TARGET, error = %write_error, "failed to report error");
    }
    error.exit_code()
}

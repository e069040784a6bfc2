//! `kore`: runs one registered command and exits.
//!
//! Framework flags such as `--app-dir` come first; the first other token
//! names the command, e.g. `kore --env=prod jobs/cleanup --days=7`.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    kore_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}

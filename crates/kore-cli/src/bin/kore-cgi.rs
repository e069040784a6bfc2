//! `kore-cgi`: answers one CGI request with the registered controllers.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    kore_cli::run_cgi(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}

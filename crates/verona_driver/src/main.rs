mod cli;
mod compiler;
mod pipeline;
mod stdlib;

use std::io;
use std::process::ExitCode;

use clap::Parser as _;
use cli::Cli;
use compiler::Compiler;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use verona_session::diagnostics::PrettyDiagnosticEmitter;
use verona_session::module_loader::FsLoader;

const LOG_ENV: &str = "VERONA_LOG";
const DEFAULT_LOG_LEVEL: &str = "warn";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let stdlib = match stdlib::locate(stdlib::STDLIB_DIR) {
        Ok(stdlib) => stdlib,
        Err(err) => {
            eprintln!("error: {:#}", anyhow::Error::from(err));
            return ExitCode::FAILURE;
        }
    };
    debug!(stdlib = %stdlib.display(), module = %cli.path.display());

    let mut compiler = Compiler::new(PrettyDiagnosticEmitter::default(), FsLoader);
    let mut stdout = io::stdout().lock();

    match pipeline::run(&mut compiler, &cli.path, &stdlib, &mut stdout) {
        Ok(success) => pipeline::exit_code(success),
        Err(err) => {
            error!("couldn't write output: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so they never mix with the tree on stdout.
fn init_logging() {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_owned());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(io::stderr)
        .init();
}

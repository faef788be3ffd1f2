mod branch;
mod cli;
mod commands;
mod config;
mod error;
mod git;
mod interaction;
mod model;
mod story;
#[cfg(test)]
mod test_support;
mod tracker;
mod version;

use std::io::Write;
use std::process::ExitCode;

use tracing::debug;

use cli::{Invocation, Outcome};

/// Environment variable holding the log filter, e.g. `PIVOTAL_LOG=pivotal=debug`.
const LOG_ENV: &str = "PIVOTAL_LOG";

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("pivotal=warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    // Parse arguments; help and bad input end here
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, options, args) = match cli::parse(&args) {
        Ok(Invocation::Help) => {
            println!("{}", cli::usage());
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Run {
            command,
            options,
            args,
        }) => (command, options, args),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    debug!(command = command.name, ?options, "running");

    // Race the command against Ctrl-C
    let work = cli::execute(command, options, &args);
    match cli::until_cancelled(work, tokio::signal::ctrl_c()).await {
        Outcome::Finished(Ok(())) => ExitCode::SUCCESS,
        Outcome::Finished(Err(e)) => {
            debug!(command = command.name, "command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
        Outcome::Cancelled => {
            println!();
            println!("Operation cancelled.");
            let _ = std::io::stdout().flush();
            // A pending stdin read would block runtime shutdown
            std::process::exit(0);
        }
    }
}

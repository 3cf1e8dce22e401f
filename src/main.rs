mod cli;
mod engine;
mod error;
mod logging;
mod model;
mod orchestrator;
mod session;
#[cfg(feature = "tui")]
mod tui;

use clap::Parser;

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();
    // Dropping the guard flushes buffered log lines, so it lives until exit.
    let log_guard = logging::init_logging(args.log_file.as_deref());

    match cli::run(args).await {
        Ok(()) => {
            tracing::info!("exiting");
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "exiting with error");
            eprintln!("Error: {e:#}");
            drop(log_guard);
            std::process::exit(1);
        }
    }
}

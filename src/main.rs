//! api-check - declarative API test-suite runner
//!
//! Executes suites of HTTP requests against a live server and writes
//! sanitized markdown transcripts suitable for publishing as API docs.

use api_check::common::{config::Config, logging};
use api_check::{cli, commands::Commands};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "api-check", about = "Run API test suites and document them")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    let result = match Config::load(cli.config.as_deref()) {
        Ok(config) => cli::dispatch(cli.command, &config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

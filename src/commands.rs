//! CLI command definitions
//!
//! Defines the clap commands for the api-check CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run test suites and write markdown transcripts
    Run {
        /// Directory transcripts are written to (default from config: ./out)
        #[arg(long, short = 'o')]
        outdir: Option<PathBuf>,

        /// Run a single suite file instead of a whole directory
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Directory suite files are discovered in (default from config: ./tests)
        #[arg(long, short = 't')]
        testdir: Option<PathBuf>,

        /// Send requests to this server instead of each suite's serverURL
        #[arg(long, short = 's')]
        server: Option<String>,

        /// Do not print transcripts to stdout
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Check that the server of each suite is healthy
    Health {
        /// Check a single suite file instead of a whole directory
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Directory suite files are discovered in (default from config: ./tests)
        #[arg(long, short = 't')]
        testdir: Option<PathBuf>,

        /// Check this server instead of each suite's serverURL
        #[arg(long, short = 's')]
        server: Option<String>,
    },
}

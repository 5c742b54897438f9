//! CLI command handling
//!
//! Resolves which suite files to process, runs each one through the health
//! gate, the initial login and the orchestrator, and prints the results.
//! A suite that fails to load or write is reported and the next one runs.

use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::paths::transcript_path;
use crate::common::Result;
use crate::http::{HttpExecutor, ReqwestExecutor};
use crate::runner::{AuthState, Orchestrator, RunOutcome, RunSettings};
use crate::suite::{discover_suites, load_suite, TestSuite};

/// Dispatch a CLI command; returns whether every suite passed
pub async fn dispatch(command: Commands, config: &Config) -> Result<bool> {
    let executor = ReqwestExecutor::new()?;

    match command {
        Commands::Run {
            outdir,
            input,
            testdir,
            server,
            quiet,
        } => {
            let files = suite_files(input, testdir, config)?;
            let outdir = outdir.unwrap_or_else(|| config.defaults.outdir.clone());
            let options = RunOptions {
                outdir,
                server,
                quiet,
            };
            Ok(run_all(&executor, config, &files, &options).await)
        }

        Commands::Health {
            input,
            testdir,
            server,
        } => {
            let files = suite_files(input, testdir, config)?;
            Ok(check_all(&executor, config, &files, server.as_deref()).await)
        }
    }
}

/// Settings shared by every suite of a `run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub outdir: PathBuf,
    pub server: Option<String>,
    pub quiet: bool,
}

/// What happened to one suite file
#[derive(Debug)]
pub enum SuiteReport {
    Completed(RunOutcome),
    Skipped { reason: String },
}

fn suite_files(
    input: Option<PathBuf>,
    testdir: Option<PathBuf>,
    config: &Config,
) -> Result<Vec<PathBuf>> {
    match input {
        Some(file) => Ok(vec![file]),
        None => {
            let dir = testdir.unwrap_or_else(|| config.defaults.testdir.clone());
            discover_suites(&dir)
        }
    }
}

fn load_with_override(path: &Path, server: Option<&str>) -> Result<TestSuite> {
    let mut suite = load_suite(path)?;
    if let Some(server) = server {
        suite.server_url = server.to_string();
    }
    Ok(suite)
}

/// Run every suite file and print a summary; returns whether all passed
pub async fn run_all(
    executor: &dyn HttpExecutor,
    config: &Config,
    files: &[PathBuf],
    options: &RunOptions,
) -> bool {
    let mut passed = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for file in files {
        match process_suite_file(executor, config, file, options).await {
            Ok(SuiteReport::Completed(outcome)) => {
                let verdict = outcome.verdict.to_string();
                let verdict = if outcome.passed() {
                    passed += 1;
                    verdict.green().bold()
                } else {
                    failed += 1;
                    verdict.red().bold()
                };
                println!(
                    "\n{} {} [{}]",
                    "Executed".blue().bold(),
                    file.display().to_string().white().bold(),
                    verdict
                );
                if !options.quiet {
                    println!("\n{}", outcome.markdown);
                }
            }
            Ok(SuiteReport::Skipped { reason }) => {
                skipped += 1;
                tracing::warn!(file = %file.display(), reason = %reason, "Suite skipped");
                println!(
                    "\n{} {} ({})",
                    "Skipped".yellow().bold(),
                    file.display(),
                    reason.dimmed()
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!(file = %file.display(), error = %e, "Suite errored");
                println!("\n{} {}: {}", "✗".red(), file.display(), e);
            }
        }
    }

    println!(
        "\n{} {} passed, {} failed, {} skipped",
        "Summary:".cyan(),
        passed.to_string().green(),
        failed.to_string().red(),
        skipped.to_string().yellow()
    );

    failed == 0
}

/// Load, gate and run a single suite file
pub async fn process_suite_file(
    executor: &dyn HttpExecutor,
    config: &Config,
    file: &Path,
    options: &RunOptions,
) -> Result<SuiteReport> {
    let suite = load_with_override(file, options.server.as_deref())?;
    tracing::info!(
        file = %file.display(),
        server = %suite.server_url,
        tests = suite.tests.len(),
        "Loaded suite"
    );

    let health = executor
        .check_health(&suite.health_url(), config.timeouts.health())
        .await;
    if !health.healthy {
        let reason = health.error.unwrap_or_else(|| "unhealthy".to_string());
        return Ok(SuiteReport::Skipped {
            reason: format!("server unhealthy: {reason}"),
        });
    }

    let orchestrator = Orchestrator::new(executor, RunSettings::from_config(config));
    let (username, password) = suite.credentials(&config.credentials);

    let auth = if suite.needs_login() {
        match orchestrator.login(&suite, &username, &password).await {
            Ok(auth) => {
                tracing::info!(user = %username, "Logged in");
                auth
            }
            Err(e) => {
                return Ok(SuiteReport::Skipped {
                    reason: format!("login failed: {e}"),
                });
            }
        }
    } else {
        AuthState::with_credentials(username, password)
    };

    let output = transcript_path(&options.outdir, file);
    let outcome = orchestrator.run_suite(&suite, auth, Some(output.as_path())).await?;
    tracing::info!(
        file = %file.display(),
        verdict = %outcome.verdict,
        output = %output.display(),
        "Suite finished"
    );

    Ok(SuiteReport::Completed(outcome))
}

/// Health-check every suite's server; returns whether all were healthy
pub async fn check_all(
    executor: &dyn HttpExecutor,
    config: &Config,
    files: &[PathBuf],
    server: Option<&str>,
) -> bool {
    let mut all_healthy = true;

    for file in files {
        let suite = match load_with_override(file, server) {
            Ok(suite) => suite,
            Err(e) => {
                all_healthy = false;
                println!("  {} {}: {}", "✗".red(), file.display(), e);
                continue;
            }
        };

        let url = suite.health_url();
        let health = executor.check_health(&url, config.timeouts.health()).await;
        if health.healthy {
            println!("  {} {} {}", "✓".green(), file.display(), url.dimmed());
        } else {
            all_healthy = false;
            println!(
                "  {} {} {} ({})",
                "✗".red(),
                file.display(),
                url.dimmed(),
                health.error.unwrap_or_default()
            );
        }
    }

    all_healthy
}

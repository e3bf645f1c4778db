//! adb-get - command-line access to the Artdatabanken species and
//! observation APIs

mod app;
mod args;
mod config;
mod display;
mod error;

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::args::Cli;
use crate::config::Config;
use crate::error::Result;

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("adb_get={}", level).parse()?)
        .add_directive(format!("artdatabanken_api={}", level).parse()?);

    // Logs go to stderr, stdout carries the results
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {}", e);
        return ExitCode::from(e.exit_code());
    }

    let config = Config::from_env(cli.config_overrides());
    debug!(config = ?config, "Configuration loaded");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match app::run(&cli, &config, &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = ?e, "adb-get failed");
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

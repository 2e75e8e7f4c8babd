//! precache - offline-first request interception
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use precache::cli::{Cli, Commands};
use precache::config::ConfigManager;
use precache::error::PrecacheResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PrecacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Loaded before logging so the log format can come from config
    let config = config_manager.load().await;
    let json_logs = matches!(&config, Ok(c) if c.general.log_format == "json");
    init_logging(cli.verbose, json_logs);

    match cli.command {
        Commands::Completions { shell } => precache::cli::commands::completions(shell),
        Commands::Config(args) => precache::cli::commands::config(args, &config_manager).await,
        command => {
            let config = config?;
            match command {
                Commands::Install => precache::cli::commands::install(&config).await,
                Commands::Activate => precache::cli::commands::activate(&config).await,
                Commands::Fetch(args) => precache::cli::commands::fetch(args, &config).await,
                Commands::Status => precache::cli::commands::status(&config).await,
                Commands::Caches(args) => precache::cli::commands::caches(args, &config).await,
                Commands::Completions { .. } | Commands::Config(_) => {
                    unreachable!("handled before config loading")
                }
            }
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; logs go to stderr
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("precache=warn"),
        1 => EnvFilter::new("precache=info"),
        _ => EnvFilter::new("precache=debug"),
    };

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }
}

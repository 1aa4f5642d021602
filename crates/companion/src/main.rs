// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Companion - streaming chat client and fine-tuning dataset tools.
//!
//! This is the binary entry point.

mod chat;
mod config_cmd;
mod dataset;
mod window;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

use companion_config::CompanionConfig;
use companion_core::CompanionError;

/// Companion - streaming chat client and fine-tuning dataset tools.
#[derive(Parser, Debug)]
#[command(name = "companion", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the configured endpoint in an interactive session.
    Chat(chat::ChatArgs),
    /// Select the messages of a conversation that fit a token budget.
    Window(window::WindowArgs),
    /// Check and price fine-tuning datasets.
    #[command(subcommand)]
    Dataset(dataset::DatasetCommand),
    /// Manage Companion configuration.
    #[command(subcommand)]
    Config(config_cmd::ConfigCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `config init` must work before any config file exists.
    if let Commands::Config(config_cmd::ConfigCommand::Init(args)) = &cli.command {
        exit_on_error(config_cmd::run_init(args));
        return;
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            companion_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.app.log_level);

    let result = match cli.command {
        Commands::Chat(args) => chat::run_chat(&config, args).await,
        Commands::Window(args) => window::run_window(&config, &args),
        Commands::Dataset(command) => dataset::run_dataset(&config, &command),
        Commands::Config(command) => config_cmd::run_config(&config, &command),
    };
    exit_on_error(result);
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<CompanionConfig, Vec<companion_config::ConfigError>> {
    match path {
        Some(path) => companion_config::load_and_validate_path(path),
        None => companion_config::load_and_validate(),
    }
}

fn exit_on_error(result: Result<(), CompanionError>) {
    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber with the configured log level.
///
/// `RUST_LOG` overrides the configured level when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("companion={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

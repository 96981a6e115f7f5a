// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classkitty - WhatsApp-connected treasury service for class funds.
//!
//! This is the binary entry point for the Classkitty service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod serve;

/// Classkitty - WhatsApp-connected treasury service for class funds.
#[derive(Parser, Debug)]
#[command(name = "classkitty", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Classkitty service (default).
    Serve,
    /// Print the effective configuration as TOML.
    Config,
}

fn init_tracing(log_level: &str) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match classkitty_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            classkitty_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    match cli.command {
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(error) => {
                eprintln!("classkitty: failed to render config: {error}");
                std::process::exit(1);
            }
        },
        Some(Commands::Serve) | None => {
            if let Err(error) = serve::run(config).await {
                tracing::error!(%error, "service exited with error");
                std::process::exit(1);
            }
        }
    }
}

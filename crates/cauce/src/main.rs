// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cauce - safety-gating gateway for an AI support chat.
//!
//! Binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// Cauce - safety-gating gateway for an AI support chat.
#[derive(Parser, Debug)]
#[command(name = "cauce", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Cauce gateway server.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cauce_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            cauce_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("cauce serve failed: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("cauce: use --help for available commands");
        }
    }
}

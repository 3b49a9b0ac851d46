// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # filenode
//!
//! The `filenode` binary runs a node agent: it exposes one directory (the
//! sandbox) to a single panel that pairs with it over sealed envelopes.
//!
//! ## Commands
//!
//! - `filenode [serve]` - Run the node HTTP API (default)
//! - `filenode identity show` - Print the node public key and pairing state
//! - `filenode config show|validate|generate` - Configuration management
//!
//! Flags override the discovered config manifest; `RUST_LOG` overrides the
//! log level from both.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use filenode::commands::{self, ConfigCommand, IdentityCommand};
use filenode::node::{self, NodeOverrides};

/// filenode - share a sandboxed directory with a paired panel
#[derive(Parser)]
#[command(name = "filenode")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = "FILENODE_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP API host (default: 0.0.0.0)
    #[arg(long, global = true, env = "NODE_HOST")]
    host: Option<String>,

    /// HTTP API port (default: 3001)
    #[arg(long, global = true, env = "NODE_PORT")]
    port: Option<u16>,

    /// Directory holding the node keypair and the panel key
    #[arg(long, global = true, env = "FILENODE_KEYS_DIR", value_name = "DIR")]
    keys_dir: Option<PathBuf>,

    /// Directory exposed to the panel
    #[arg(long, global = true, env = "FILENODE_SANDBOX_ROOT", value_name = "DIR")]
    sandbox_root: Option<PathBuf>,

    /// Serve Prometheus metrics on this port
    #[arg(long, global = true, env = "FILENODE_METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FILENODE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node HTTP API
    #[command(name = "serve")]
    Serve,

    /// Node identity
    #[command(name = "identity")]
    Identity {
        #[command(subcommand)]
        command: IdentityCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let overrides = NodeOverrides {
        host: cli.host,
        port: cli.port,
        keys_dir: cli.keys_dir,
        sandbox_root: cli.sandbox_root,
        log_level: cli.log_level,
        metrics_port: cli.metrics_port,
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = overrides.resolve(cli.config)?;
            init_logging(&config.spec.observability.log_level)?;
            node::start_node(config)
                .await
                .inspect_err(|e| tracing::error!("Node failed: {:#}", e))
        }
        Commands::Identity { command } => {
            let config = overrides.resolve(cli.config)?;
            init_logging("warn")?;
            commands::identity::handle_command(command, &config).await
        }
        Commands::Config { command } => {
            init_logging(overrides.log_level.as_deref().unwrap_or("warn"))?;
            commands::config::handle_command(command, cli.config, &overrides).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

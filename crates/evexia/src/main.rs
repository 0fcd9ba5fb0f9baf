//! Evexia - client state tools for the Evexia admin platform
//!
//! Main entry point for the Evexia CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;

mod commands;

use commands::{auth, cache, config, prefs, session};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Evexia - session timeout and entity cache tools for the Evexia admin platform
#[derive(Parser)]
#[command(name = "evexia")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Local storage file (default: storage.json in the data directory)
    #[arg(long, global = true, env = "EVEXIA_STORAGE")]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch a signed-in session for inactivity
    Session(session::SessionArgs),

    /// Session preferences
    Prefs(prefs::PrefsArgs),

    /// Stored credentials
    Auth(auth::AuthArgs),

    /// Entity cache tools
    Cache(cache::CacheArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

const CRATES: [&str; 4] = ["evexia", "evexia_store", "evexia_session", "evexia_config"];

fn crate_filter(level: &str, fallback: &str) -> String {
    let mut directives: Vec<String> = CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect();
    directives.push(fallback.to_string());
    directives.join(",")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = evexia_config::load_config();
    let logging = loaded.config.logging();

    // Console logging on stderr, plus an optional rotating JSON file
    let console_filter = if cli.verbose {
        crate_filter("debug", "info")
    } else {
        crate_filter(&logging.level, "warn")
    };

    let (file_layer, _guard) = if logging.file {
        let log_dir = logging
            .directory
            .clone()
            .or_else(|| evexia_config::config_dir().map(|d| d.join("logs")))
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_appender = tracing_appender::rolling::daily(&log_dir, "evexia.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(tracing_subscriber::EnvFilter::new(crate_filter(
                "trace", "info",
            )));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(console_filter)),
        )
        .with(file_layer)
        .init();

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let storage_path = cli
        .storage
        .unwrap_or_else(|| loaded.config.storage().resolve_path());

    // Create context for commands
    let ctx = commands::Context {
        config: loaded.config,
        storage_path,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Session(args) => session::run(args, &ctx).await,
        Commands::Prefs(args) => prefs::run(args, &ctx).await,
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Cache(args) => cache::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

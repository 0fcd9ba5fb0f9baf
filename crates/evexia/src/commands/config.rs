//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use clap::{Args, Subcommand};

use evexia_config::{
    self, ConfigPaths, EvexiaConfig, LayerStatus, LoggingConfig, StorageConfig,
};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./evexia.toml) instead of user config
        #[arg(long)]
        local: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(),
        ConfigCommand::Init { local } => cmd_init(local),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = evexia_config::load_config();

    if ctx.json_output {
        let layers: Vec<_> = loaded
            .layers
            .iter()
            .map(|report| {
                serde_json::json!({
                    "layer": format!("{:?}", report.layer).to_lowercase(),
                    "path": report.path,
                    "status": format!("{:?}", report.status).to_lowercase(),
                })
            })
            .collect();
        let value = serde_json::json!({
            "layers": layers,
            "warnings": loaded.warnings,
            "storage": ctx.storage_path,
            "logging": {
                "level": ctx.config.logging().level,
                "file": ctx.config.logging().file,
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("# Evexia Configuration\n");

    let applied = loaded.applied();
    if applied.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for path in &applied {
            println!("  {}", path.display());
        }
        println!();
    }

    if ctx.verbose {
        println!("Checked:");
        for report in &loaded.layers {
            let status = match report.status {
                LayerStatus::Applied => "applied",
                LayerStatus::Missing => "missing",
                LayerStatus::Rejected => "rejected",
            };
            println!("  {:?}: {} ({})", report.layer, report.path.display(), status);
        }
        println!();
    }

    for warning in &loaded.warnings {
        println!("warning: {}", warning);
    }

    let logging = ctx.config.logging();
    println!("Storage:  {}", ctx.storage_path.display());
    println!("Logging:  level={} file={}", logging.level, logging.file);
    Ok(())
}

fn user_config_path() -> Result<PathBuf> {
    evexia_config::user_config_path()
        .ok_or_else(|| anyhow!("Could not determine the user config directory"))
}

fn cmd_path() -> Result<()> {
    println!("{}", user_config_path()?.display());
    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        ConfigPaths::discover().project_file()
    } else {
        user_config_path()?
    };

    if path.exists() {
        bail!("Config already exists at {}", path.display());
    }

    let config = EvexiaConfig {
        storage: Some(StorageConfig::default()),
        logging: Some(LoggingConfig::default()),
    };
    evexia_config::write_config(&config, &path)?;
    println!("Created {}", path.display());
    Ok(())
}

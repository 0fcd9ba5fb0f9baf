//! Cache command - load API payloads into the entity cache.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Args, Subcommand};
use serde_json::Value;

use evexia_store::EntityCache;

use super::Context;

/// Arguments for the cache command.
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Load a JSON array of entities and look one up
    Inspect {
        /// Entity type to cache the records under (e.g. client, user)
        entity_type: String,

        /// JSON file holding an array of records
        file: PathBuf,

        /// Id to look up; prints cache statistics when omitted
        id: Option<String>,

        /// Field holding each record's id
        #[arg(long, default_value = "id")]
        key: String,
    },
}

/// Run the cache command.
pub async fn run(args: CacheArgs, ctx: &Context) -> Result<()> {
    match args.command {
        CacheCommand::Inspect {
            entity_type,
            file,
            id,
            key,
        } => cmd_inspect(&entity_type, &file, id.as_deref(), &key, ctx),
    }
}

fn cmd_inspect(
    entity_type: &str,
    file: &Path,
    id: Option<&str>,
    key: &str,
    ctx: &Context,
) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records: Vec<Value> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array", file.display()))?;
    let total = records.len();

    let cache = EntityCache::new();
    let stored = if key == "id" {
        cache.set_many(entity_type, records)
    } else {
        cache.set_many_by(entity_type, records, |record: &Value| {
            match record.get(key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        })
    };
    tracing::debug!(entity_type = %entity_type, total = total, stored = stored, "Records cached");

    match id {
        Some(id) => {
            let Some(record) = cache.get::<Value>(entity_type, id) else {
                bail!("No {} with {} {:?} in {}", entity_type, key, id, file.display());
            };
            println!("{}", serde_json::to_string_pretty(record.as_ref())?);
        }
        None => {
            let ids = cache.ids(entity_type);
            if ctx.json_output {
                let value = serde_json::json!({
                    "entity_type": entity_type,
                    "records": total,
                    "cached": stored,
                    "skipped": total - stored,
                    "ids": ids,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!(
                    "Cached {} of {} {} record(s) ({} skipped without {:?})",
                    stored,
                    total,
                    entity_type,
                    total - stored,
                    key
                );
                for id in ids {
                    println!("  {}", id);
                }
            }
        }
    }

    Ok(())
}

//! Caches command - inspect cache partitions

use crate::cache::{CacheKey, CacheNames, PartitionRole, PartitionStore};
use crate::cli::args::{CachesAction, CachesArgs, OutputFormat};
use crate::config::Config;
use crate::error::{PrecacheError, PrecacheResult};
use crate::net::Response;
use crate::worker::factory::create_store;
use console::style;
use serde::Serialize;

/// Execute the caches command
pub async fn execute(args: CachesArgs, config: &Config) -> PrecacheResult<()> {
    let store = create_store(config).await?;
    let names = CacheNames::from_config(&config.caches);

    match args.action {
        CachesAction::List { format } => list_partitions(store.as_ref(), &names, format).await,
        CachesAction::Show { name, format } => show_partition(store.as_ref(), &name, format).await,
    }
}

#[derive(Debug, Serialize)]
struct PartitionSummary {
    name: String,
    role: String,
    entries: usize,
    bytes: u64,
}

async fn summarize(
    store: &dyn PartitionStore,
    names: &CacheNames,
) -> PrecacheResult<Vec<PartitionSummary>> {
    let mut summaries = Vec::new();
    for name in store.names().await? {
        let entries = store.entries(&name).await?.unwrap_or_default();
        let role = match names.role_of(&name) {
            Some(role) => role.to_string(),
            None => "stale".to_string(),
        };
        summaries.push(PartitionSummary {
            entries: entries.len(),
            bytes: entries.iter().map(|(_, r)| r.body.len() as u64).sum(),
            role,
            name,
        });
    }
    Ok(summaries)
}

/// List all partitions
async fn list_partitions(
    store: &dyn PartitionStore,
    names: &CacheNames,
    format: OutputFormat,
) -> PrecacheResult<()> {
    let summaries = summarize(store, names).await?;

    if summaries.is_empty() && !matches!(format, OutputFormat::Json) {
        println!("No cache partitions found.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => {
            println!("{:<32} {:<10} {:>8} {:>10}", "PARTITION", "ROLE", "ENTRIES", "SIZE");
            println!("{}", "-".repeat(63));
            for s in &summaries {
                let role = match names.role_of(&s.name) {
                    Some(PartitionRole::Shell) => style(format!("{:<10}", s.role)).green(),
                    Some(PartitionRole::Dynamic) => style(format!("{:<10}", s.role)).cyan(),
                    None => style(format!("{:<10}", s.role)).dim(),
                };
                println!(
                    "{:<32} {} {:>8} {:>10}",
                    s.name,
                    role,
                    s.entries,
                    format_bytes(s.bytes)
                );
            }
            println!();
            println!("Total: {} partition(s)", summaries.len());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Plain => {
            for s in &summaries {
                println!("{}", s.name);
            }
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct EntryJson<'a> {
    method: &'a str,
    url: &'a str,
    status: u16,
    #[serde(rename = "type")]
    kind: String,
    bytes: usize,
    captured_at: String,
}

impl<'a> EntryJson<'a> {
    fn new(key: &'a CacheKey, response: &'a Response) -> Self {
        Self {
            method: key.method.as_str(),
            url: &key.url,
            status: response.status,
            kind: response.kind.to_string(),
            bytes: response.body.len(),
            captured_at: response.captured_at.to_rfc3339(),
        }
    }
}

/// List the entries of one partition
async fn show_partition(
    store: &dyn PartitionStore,
    name: &str,
    format: OutputFormat,
) -> PrecacheResult<()> {
    let entries = store
        .entries(name)
        .await?
        .ok_or_else(|| PrecacheError::PartitionNotFound(name.to_string()))?;

    match format {
        OutputFormat::Table => {
            println!("{:<7} {:<56} {:>6} {:<7} {:>10}", "METHOD", "URL", "STATUS", "TYPE", "SIZE");
            println!("{}", "-".repeat(90));
            for (key, response) in &entries {
                println!(
                    "{:<7} {:<56} {:>6} {:<7} {:>10}",
                    key.method,
                    key.url,
                    response.status,
                    response.kind,
                    format_bytes(response.body.len() as u64)
                );
            }
            println!();
            println!("Total: {} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
        }
        OutputFormat::Json => {
            let json: Vec<EntryJson<'_>> = entries.iter().map(|(k, r)| EntryJson::new(k, r)).collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => {
            for (key, _) in &entries {
                println!("{}", key.url);
            }
        }
    }

    Ok(())
}

/// Format bytes as human-readable size (e.g., "1.5 MB")
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

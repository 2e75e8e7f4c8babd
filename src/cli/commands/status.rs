//! Status command - worker state and partitions at a glance

use crate::cache::PartitionRole;
use crate::config::Config;
use crate::error::PrecacheResult;
use crate::ui::{self, UiContext};
use crate::worker::{create_worker, WorkerState};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static STALE: Emoji<'_, '_> = Emoji("⚠ ", "[STALE] ");

/// Execute the status command
pub async fn execute(config: &Config) -> PrecacheResult<()> {
    let ctx = UiContext::detect();
    let worker = create_worker(config).await?;
    let record = worker.record().await;

    println!("{}", style("precache status").bold().cyan());

    ui::section(&ctx, "Worker");
    ui::key_value(&ctx, "id", &record.id.to_string());
    ui::key_value(&ctx, "scope", worker.scope().as_str());
    ui::key_value(&ctx, "version", &record.version);
    let state = match record.state {
        WorkerState::Activated => style(record.state.to_string()).green(),
        WorkerState::Redundant => style(record.state.to_string()).red(),
        _ => style(record.state.to_string()).yellow(),
    };
    ui::key_value(&ctx, "state", &state.to_string());
    ui::key_value(&ctx, "skip waiting", &record.skip_waiting.to_string());
    if let Some(at) = record.installed_at {
        ui::key_value(&ctx, "installed", &at.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Some(at) = record.activated_at {
        ui::key_value(&ctx, "activated", &at.format("%Y-%m-%d %H:%M:%S").to_string());
    }

    ui::section(&ctx, "Partitions");
    let existing = worker.store().names().await?;
    for role in [PartitionRole::Shell, PartitionRole::Dynamic] {
        let current = worker.names().for_role(role);
        if existing.iter().any(|name| name == current) {
            println!("  {}{} {}", CHECK, current, style(format!("({})", role)).dim());
        } else {
            println!("  {}{} {}", CROSS, current, style("(not created)").dim());
        }
    }
    let stale = worker.names().allow_list().stale(&existing);
    for name in &stale {
        println!("  {}{} {}", STALE, name, style("(removed on activate)").dim());
    }

    if record.state != WorkerState::Activated {
        println!();
        let next = if record.state.can_activate() {
            "precache activate"
        } else {
            "precache install"
        };
        ui::step_warn_hint(&ctx, "Worker is not active", &format!("Run: {}", next));
    }

    Ok(())
}

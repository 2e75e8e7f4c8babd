//! Activate command - sweep stale partitions

use crate::config::Config;
use crate::error::PrecacheResult;
use crate::ui::{self, UiContext};
use crate::worker::create_worker;

/// Execute the activate command
pub async fn execute(config: &Config) -> PrecacheResult<()> {
    let ctx = UiContext::detect();
    let worker = create_worker(config).await?;

    let activation = worker.activate().await?;

    if activation.deleted.is_empty() {
        ui::step_info(&ctx, "No stale partitions");
    }
    for name in &activation.deleted {
        ui::step_ok_detail(&ctx, "Deleted stale partition", name);
    }

    ui::step_ok_detail(
        &ctx,
        "Worker activated",
        &format!(
            "keeping {} and {}",
            worker.names().shell,
            worker.names().dynamic
        ),
    );
    Ok(())
}

//! Install command - precache the app shell

use crate::config::Config;
use crate::error::PrecacheResult;
use crate::ui::{self, TaskSpinner, UiContext};
use crate::worker::create_worker;

/// Execute the install command
pub async fn execute(config: &Config) -> PrecacheResult<()> {
    let ctx = UiContext::detect();
    let worker = create_worker(config).await?;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!(
        "Precaching {} app shell assets from {}...",
        worker.manifest().len(),
        worker.scope()
    ));

    match worker.install().await {
        Ok(stored) => {
            spinner.stop(&format!(
                "App shell precached into {} ({} entries)",
                worker.names().shell,
                stored
            ));
            ui::step_info(&ctx, "Waiting skipped: run `precache activate` to take over clients");
            Ok(())
        }
        Err(e) => {
            spinner.stop_error("App shell precache failed");
            Err(e)
        }
    }
}

//! Activate command - promote the waiting version and reap stale caches

use super::Site;
use crate::config::Config;
use crate::error::SwResult;
use crate::ui::{self, UiContext};

/// Execute the activate command
pub async fn execute(config: &Config) -> SwResult<()> {
    let ctx = UiContext::detect();
    let site = Site::open(config)?;
    let name = site.settings.cache_name.clone();
    let mut registration = site.registration().await?;

    if registration.active.as_ref() == Some(&name) {
        ui::step_ok(&ctx, &format!("{} is already active", name));
        return Ok(());
    }

    let mut worker = site.waiting(&registration)?;

    ui::intro(&ctx, &format!("Activating {}", name));
    let deleted = worker.activate().await?;

    registration.record_activated(&name);
    registration.save(site.root()).await?;

    if deleted.is_empty() {
        ui::step_info(&ctx, "No stale caches");
    }
    for stale in &deleted {
        ui::step_ok(&ctx, &format!("Deleted stale cache {}", stale));
    }
    ui::outro_success(&ctx, &format!("{} active", name));
    Ok(())
}

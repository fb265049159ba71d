//! Install command - precache the configured version

use super::Site;
use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::SwResult;
use crate::store::CacheStorage;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> SwResult<()> {
    let ctx = UiContext::detect();
    let site = Site::open(config)?;
    let name = site.settings.cache_name.clone();
    let mut registration = site.registration().await?;

    ui::intro(&ctx, &format!("Installing {}", name));

    if registration.active.as_ref() == Some(&name) && site.storage.has(&name).await? {
        ui::step_ok(&ctx, &format!("{} is already active", name));
        ui::remark(&ctx, "Bump cache.version to deploy a new version");
        return Ok(());
    }

    let mut worker = site.worker();
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Precaching {} URLs", site.settings.manifest.len()));

    let stored = match worker.install().await {
        Ok(stored) => stored,
        Err(e) => {
            spinner.stop_error("Precache failed");
            return Err(e);
        }
    };
    spinner.stop(&format!("Precached {} entries", stored));

    registration.record_installed(&name);
    registration.save(site.root()).await?;

    if !config.lifecycle.skip_waiting || args.no_activate {
        ui::step_info(&ctx, &format!("{} installed and waiting", name));
        ui::outro_success(&ctx, "Run: swcache activate");
        return Ok(());
    }

    let deleted = worker.activate().await?;
    registration.record_activated(&name);
    registration.save(site.root()).await?;

    for stale in &deleted {
        ui::step_ok(&ctx, &format!("Deleted stale cache {}", stale));
    }
    ui::outro_success(&ctx, &format!("{} active", name));
    Ok(())
}

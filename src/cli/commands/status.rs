//! Status command - show registration and cache store health

use super::Site;
use crate::config::Config;
use crate::error::SwResult;
use crate::store::CacheStorage;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> SwResult<()> {
    let site = Site::open(config)?;
    let current = &site.settings.cache_name;
    let registration = site.registration().await?;
    let names = site.storage.names().await?;

    println!("{}", style("swcache status").bold().cyan());
    println!();

    println!("{}", style("Site:").bold());
    println!("  Scope: {}", config.scope_url()?);
    println!("  Store: {}", site.root().display());
    println!("  Current version: {}", current);

    println!();
    println!("{}", style("Worker:").bold());
    let mut all_ok = true;

    match &registration.active {
        Some(active) if active == current && names.contains(active) => {
            println!("  {} Active: {}", CHECK, active);
        }
        Some(active) if active == current => {
            println!("  {} Active: {} (store missing)", CROSS, active);
            all_ok = false;
        }
        Some(active) => {
            println!("  {} Active: {} (serving, outdated)", WARN, active);
            all_ok = false;
        }
        None => {
            println!("  {} No active version", CROSS);
            all_ok = false;
        }
    }

    if let Some(installed) = &registration.installed {
        println!("  {} Waiting: {}", WARN, installed);
    }
    println!(
        "  Controlling pages: {}",
        if registration.controlling { "yes" } else { "no" }
    );
    if let Some(updated) = registration.updated_at {
        println!("  Updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    println!();
    println!("{}", style("Cache stores:").bold());
    if names.is_empty() {
        println!("  none");
    }
    let waiting = registration.installed.as_ref();
    for name in &names {
        let entries = site.storage.open(name).await?.keys().await?.len();
        let stale = Some(name) != registration.active.as_ref() && Some(name) != waiting;
        let marker = if stale { WARN } else { CHECK };
        println!("  {}{} ({} entries)", marker, name, entries);
    }

    println!();
    if all_ok {
        println!("{}", style("Worker is serving the current version").green().bold());
    } else {
        let next = if waiting == Some(current) {
            "Run: swcache activate"
        } else {
            "Run: swcache install"
        };
        println!("{}", style(next).yellow().bold());
    }

    Ok(())
}

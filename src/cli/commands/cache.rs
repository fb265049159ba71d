//! Cache command - inspect or clear cache stores

use super::Site;
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::{SwError, SwResult};
use crate::http::RequestKey;
use crate::store::{CacheName, CacheStorage};
use crate::ui::{self, UiContext};
use crate::worker::Registration;
use console::style;
use serde::Serialize;
use tokio::fs;

/// One cache store as listed
#[derive(Debug, Serialize)]
struct CacheSummary {
    name: CacheName,
    entries: usize,
    current: bool,
    active: bool,
}

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> SwResult<()> {
    let site = Site::open(config)?;

    match args.action {
        CacheAction::List { format } => list_caches(&site, format).await,
        CacheAction::Show { name, format } => show_cache(&site, name, format).await,
        CacheAction::Clear { yes } => clear_caches(&site, yes).await,
    }
}

async fn list_caches(site: &Site, format: OutputFormat) -> SwResult<()> {
    let registration = site.registration().await?;
    let mut caches = Vec::new();

    for name in site.storage.names().await? {
        let entries = site.storage.open(&name).await?.keys().await?.len();
        caches.push(CacheSummary {
            current: name == site.settings.cache_name,
            active: registration.active.as_ref() == Some(&name),
            name,
            entries,
        });
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&caches)?),
        OutputFormat::Plain => {
            for cache in &caches {
                println!("{}", cache.name);
            }
        }
        OutputFormat::Table => {
            if caches.is_empty() {
                println!("No cache stores found.");
                return Ok(());
            }
            print_cache_table(&caches);
        }
    }

    Ok(())
}

fn print_cache_table(caches: &[CacheSummary]) {
    println!("{:<36} {:>8} {:<10}", "NAME", "ENTRIES", "STATE");
    println!("{}", "-".repeat(56));

    for cache in caches {
        let state = if cache.active {
            style("active").green().to_string()
        } else if cache.current {
            style("waiting").cyan().to_string()
        } else {
            style("stale").yellow().to_string()
        };
        println!("{:<36} {:>8} {:<10}", cache.name, cache.entries, state);
    }
}

async fn show_cache(site: &Site, name: Option<String>, format: OutputFormat) -> SwResult<()> {
    let name = match name {
        Some(name) => CacheName::new(name)?,
        None => site.settings.cache_name.clone(),
    };

    // open() would create a missing store
    if !site.storage.has(&name).await? {
        return Err(SwError::User(format!("No cache store named {}", name)));
    }

    let mut keys: Vec<RequestKey> = site.storage.open(&name).await?.keys().await?;
    keys.sort();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&keys)?),
        OutputFormat::Plain | OutputFormat::Table => {
            for key in &keys {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

async fn clear_caches(site: &Site, yes: bool) -> SwResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let names = site.storage.names().await?;
    let registration_path = Registration::path(site.root());

    if names.is_empty() && !registration_path.exists() {
        ui::step_info(&ctx, "Nothing to clear");
        return Ok(());
    }

    let message = format!("Delete {} cache stores and the registration?", names.len());
    if !ui::confirm(&ctx, &message, false).await? {
        ui::step_warn_hint(&ctx, "Aborted", "Pass --yes to clear without asking");
        return Ok(());
    }

    for name in &names {
        if site.storage.delete(name).await? {
            ui::step_ok(&ctx, &format!("Deleted {}", name));
        }
    }

    if registration_path.exists() {
        fs::remove_file(&registration_path)
            .await
            .map_err(|e| SwError::io(format!("removing {}", registration_path.display()), e))?;
        ui::step_ok(&ctx, "Registration removed");
    }

    Ok(())
}

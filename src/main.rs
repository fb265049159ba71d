//! swcache - Offline page cache router
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use swcache::cli::args::ConfigAction;
use swcache::cli::{commands, Cli, Commands};
use swcache::config::ConfigManager;
use swcache::error::SwResult;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SwResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Writing a fresh config must work even when the current one is broken
    if let Commands::Config(ref args) = cli.command {
        if let Some(ConfigAction::Init { force }) = &args.action {
            init_logging(cli.verbose, false);
            return commands::config::init(&config_manager, *force).await;
        }
    }

    let config = config_manager.load().await?;
    init_logging(cli.verbose, config.general.log_format == "json");

    match cli.command {
        Commands::Install(args) => commands::install(args, &config).await,
        Commands::Activate => commands::activate(&config).await,
        Commands::Fetch(args) => commands::fetch(args, &config).await,
        Commands::Classify(args) => commands::classify(args, &config).await,
        Commands::Cache(args) => commands::cache(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
        Commands::Status => commands::status(&config).await,
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug. `RUST_LOG` overrides.
fn init_logging(verbose: u8, json: bool) {
    let default = match verbose {
        0 => "swcache=warn",
        1 => "swcache=info",
        _ => "swcache=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// swcache - Offline page cache router
///
/// Precaches a site's critical assets into a versioned cache store and
/// routes requests through cache-first, stale-while-revalidate,
/// network-first and network-only strategies.
#[derive(Parser, Debug)]
#[command(name = "swcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SWCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the configured cache version (precache the manifest)
    Install(InstallArgs),

    /// Activate the installed version and delete stale caches
    Activate,

    /// Route one request through the active worker
    Fetch(FetchArgs),

    /// Show how a URL would be classified and which strategy applies
    Classify(ClassifyArgs),

    /// Inspect or clear cache stores
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Show registration and cache store status
    Status,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Stay installed and waiting even if lifecycle.skip_waiting is set
    #[arg(long)]
    pub no_activate: bool,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL to request
    pub url: String,

    /// Issue the request as a top-level navigation
    #[arg(long)]
    pub navigate: bool,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request body, sent with POST, PUT and PATCH
    #[arg(short, long)]
    pub data: Option<String>,

    /// Extra request header ("Name: value"), repeatable
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Write the response body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print status and headers only
    #[arg(short = 'I', long)]
    pub head: bool,
}

/// Arguments for the classify command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Absolute URL to classify
    pub url: String,

    /// Treat the request as a top-level navigation
    #[arg(long)]
    pub navigate: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache stores
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the entries of one cache store (defaults to the current version)
    Show {
        /// Cache name
        name: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete every cache store and the registration
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

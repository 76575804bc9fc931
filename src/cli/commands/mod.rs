//! CLI parser and dispatch to command-specific modules.

mod init;
mod logs;
mod remote;
mod seo;
mod serve;
mod site;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "clickrank")]
#[command(about = "Sync SEO metadata between ClickRank and a site")]
#[command(version)]
pub struct Cli {
    /// Data directory holding clickrank.db (overrides config file).
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the webhook server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:8080)
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },

    /// Pull pending optimizations from ClickRank and apply them
    Sync,

    /// Register the webhook URL with ClickRank
    Announce,

    /// Check connectivity to ClickRank and record the result
    HealthCheck,

    /// Show what a URL resolves to
    Resolve {
        url: String,
    },

    /// Apply an optimization payload from a JSON file
    Apply {
        /// Payload file (webhook format)
        file: PathBuf,
    },

    /// Revert optimizations for a URL
    Revert {
        url: String,
        /// Fields to revert (default: all)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Show the stored SEO record for a URL
    Show {
        url: String,
    },

    /// Delete the stored SEO record for a URL
    Delete {
        url: String,
    },

    /// Delete SEO records not updated recently
    Cleanup {
        /// Maximum age in days (default: retention_days from config)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Trim the activity log and purge stale SEO records
    Maintenance,

    /// Show recent activity log entries
    Logs {
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only show one level (debug, info, warning, error, critical)
        #[arg(long)]
        level: Option<String>,
    },

    /// Show SEO table and activity statistics
    Stats,

    /// Load posts, taxonomies, terms and attachments from a JSON export
    ImportSite {
        file: PathBuf,
    },

    /// Copy legacy post metadata and homepage options into the URL table
    Backfill,

    /// Drop the homepage revert backup
    ClearHomepageBackup,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
        Commands::Sync => remote::cmd_sync(&settings).await,
        Commands::Announce => remote::cmd_announce(&settings).await,
        Commands::HealthCheck => remote::cmd_health_check(&settings).await,
        Commands::Resolve { url } => seo::cmd_resolve(&settings, &url).await,
        Commands::Apply { file } => seo::cmd_apply(&settings, &file).await,
        Commands::Revert { url, fields } => seo::cmd_revert(&settings, &url, &fields).await,
        Commands::Show { url } => seo::cmd_show(&settings, &url).await,
        Commands::Delete { url } => seo::cmd_delete(&settings, &url).await,
        Commands::Cleanup { days } => seo::cmd_cleanup(&settings, days).await,
        Commands::Maintenance => logs::cmd_maintenance(&settings).await,
        Commands::Logs { limit, level } => logs::cmd_logs(&settings, limit, level.as_deref()).await,
        Commands::Stats => seo::cmd_stats(&settings).await,
        Commands::ImportSite { file } => site::cmd_import_site(&settings, &file).await,
        Commands::Backfill => site::cmd_backfill(&settings).await,
        Commands::ClearHomepageBackup => seo::cmd_clear_homepage_backup(&settings).await,
    }
}

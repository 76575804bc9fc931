//! Initialize command.

use console::style;

use crate::app::App;
use crate::config::Settings;

/// Create the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    let version = app.db.get_schema_version().await?;

    println!(
        "{} Initialized ClickRank in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!("  Schema version: {}", version.as_deref().unwrap_or("unknown"));
    println!("  Site: {}", settings.home_url());
    println!("  Webhook: {}", settings.webhook_url());
    println!("  SEO plugin: {}", settings.compat_mode.as_str());

    if settings.api_key().is_none() {
        println!(
            "{} No API key configured. Set api_key in clickrank.toml or CLICKRANK_API_KEY",
            style("!").yellow()
        );
    }

    Ok(())
}

//! Site content commands.

use std::path::Path;

use console::style;

use crate::app::App;
use crate::config::Settings;
use crate::models::SiteExport;

/// Load a site export into the site tables.
pub async fn cmd_import_site(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file).await?;
    let export: SiteExport = serde_json::from_str(&raw)?;

    let app = App::bootstrap(settings.clone()).await?;
    println!("{} Importing {}", style("→").cyan(), file.display());
    let summary = app.site.import(&export).await?;

    println!("{} Import complete", style("✓").green());
    println!("  Posts: {}", summary.posts);
    println!("  Taxonomies: {}", summary.taxonomies);
    println!("  Terms: {}", summary.terms);
    println!("  Attachments: {}", summary.attachments);
    Ok(())
}

pub async fn cmd_backfill(settings: &Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    let report = app.backfill().run().await?;

    println!("{} Backfill complete", style("✓").green());
    println!(
        "  Homepage: {}",
        if report.homepage { "migrated" } else { "nothing to migrate" }
    );
    println!("  Posts processed: {}", report.processed);
    println!("  Migrated: {}", report.migrated);
    println!("  Skipped: {}", report.skipped);
    for error in &report.errors {
        println!("  {} {}", style("✗").red(), error);
    }
    Ok(())
}

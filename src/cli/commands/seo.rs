//! SEO table and reconciliation commands.

use std::path::Path;

use console::style;

use crate::app::App;
use crate::cli::helpers::{print_outcome, print_record};
use crate::config::Settings;
use crate::models::{ContentRef, OptimizationPayload};

/// Show what a URL resolves to.
pub async fn cmd_resolve(settings: &Settings, url: &str) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    let content = app.engine.resolve(url).await?;

    match content {
        ContentRef::Unknown => println!("{} {} does not resolve", style("!").yellow(), url),
        other => println!("{} {} -> {}", style("✓").green(), url, other),
    }
    Ok(())
}

/// Apply a payload file through the same path as the webhook.
pub async fn cmd_apply(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file).await?;
    let payload: OptimizationPayload = serde_json::from_str(&raw)?;

    let app = App::bootstrap(settings.clone()).await?;
    match app.engine.handle(payload).await {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e);
            Err(e.into())
        }
    }
}

/// Revert a URL.
pub async fn cmd_revert(settings: &Settings, url: &str, fields: &[String]) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    match app.engine.revert_url(url, fields).await {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e);
            Err(e.into())
        }
    }
}

pub async fn cmd_show(settings: &Settings, url: &str) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    match app.db.seo_data().get(url).await? {
        Some(record) => print_record(&record),
        None => println!("{} No SEO data stored for {}", style("!").yellow(), url),
    }
    Ok(())
}

pub async fn cmd_delete(settings: &Settings, url: &str) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    if app.db.seo_data().delete(url).await? {
        app.log
            .info(&format!("Deleted SEO data for: {}", url))
            .await;
        println!("{} Deleted {}", style("✓").green(), url);
    } else {
        println!("{} No SEO data stored for {}", style("!").yellow(), url);
    }
    Ok(())
}

/// Delete rows older than `days` (default: the configured retention).
pub async fn cmd_cleanup(settings: &Settings, days: Option<u32>) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    let days = days.unwrap_or(settings.retention_days);
    let removed = app.db.seo_data().cleanup(days).await?;
    println!(
        "{} Removed {} record(s) older than {} days",
        style("✓").green(),
        removed,
        days
    );
    Ok(())
}

pub async fn cmd_stats(settings: &Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    let seo = app.db.seo_data().statistics().await?;
    let logs = app.log.stats().await?;

    println!("{} SEO table", style("→").cyan());
    println!("  Records: {}", seo.total);
    println!("  With title: {}", seo.with_title);
    println!("  With description: {}", seo.with_description);
    println!("  With canonical: {}", seo.with_canonical);
    println!("  With schema: {}", seo.with_schema);
    if let (Some(oldest), Some(newest)) = (seo.oldest, seo.newest) {
        println!("  Oldest update: {}", oldest.to_rfc3339());
        println!("  Newest update: {}", newest.to_rfc3339());
    }

    println!("{} Activity (last 24h)", style("→").cyan());
    println!("  Total: {}", logs.total);
    println!(
        "  Info: {}  Warning: {}  Error: {}  Critical: {}",
        logs.info, logs.warning, logs.error, logs.critical
    );
    Ok(())
}

pub async fn cmd_clear_homepage_backup(settings: &Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    if app.engine.clear_homepage_backup().await? {
        println!("{} Homepage backup cleared", style("✓").green());
    } else {
        println!("{} No homepage backup stored", style("!").yellow());
    }
    Ok(())
}

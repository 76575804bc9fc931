//! Activity log commands.

use console::style;

use crate::app::App;
use crate::config::Settings;
use crate::models::LogLevel;
use crate::services::run_maintenance;

pub async fn cmd_logs(settings: &Settings, limit: usize, level: Option<&str>) -> anyhow::Result<()> {
    let level = match level {
        Some(name) => Some(
            LogLevel::from_str(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown log level: {}", name))?,
        ),
        None => None,
    };

    let app = App::bootstrap(settings.clone()).await?;
    let entries = app.log.recent(limit, level).await?;
    if entries.is_empty() {
        println!("{} No log entries", style("!").yellow());
        return Ok(());
    }

    for entry in entries.iter().rev() {
        let level = match entry.level {
            LogLevel::Error | LogLevel::Critical => style(entry.level.as_str()).red(),
            LogLevel::Warning => style(entry.level.as_str()).yellow(),
            LogLevel::Debug => style(entry.level.as_str()).dim(),
            LogLevel::Info => style(entry.level.as_str()).cyan(),
        };
        println!(
            "{} {:<8} {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            level,
            entry.message
        );
    }
    Ok(())
}

pub async fn cmd_maintenance(settings: &Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    let seo = app.db.seo_data();
    let report = run_maintenance(
        &seo,
        &app.log,
        settings.max_log_entries,
        settings.retention_days,
    )
    .await?;

    println!("{} Maintenance complete", style("✓").green());
    println!("  Log entries removed: {}", report.log_entries_removed);
    println!("  SEO records removed: {}", report.seo_rows_removed);
    Ok(())
}

//! Commands that talk to the ClickRank platform.

use console::style;

use crate::app::App;
use crate::config::Settings;

/// Pull and apply pending optimizations.
pub async fn cmd_sync(settings: &Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    let orchestrator = app.sync_orchestrator()?;

    println!("{} Syncing with {}", style("→").cyan(), settings.api_base_url);
    let report = orchestrator.sync().await?;

    if report.processed == 0 {
        println!("{} Nothing to sync", style("✓").green());
        return Ok(());
    }

    for failure in &report.failures {
        println!(
            "  {} {}: {}",
            style("✗").red(),
            failure.page_url,
            failure.error
        );
    }

    let summary = format!(
        "{}/{} pages updated",
        report.successful, report.processed
    );
    if report.succeeded() {
        println!("{} {}", style("✓").green(), summary);
        Ok(())
    } else {
        println!("{} {}", style("✗").red(), summary);
        Err(anyhow::anyhow!("Sync failed: no pages updated"))
    }
}

/// Register the webhook URL.
pub async fn cmd_announce(settings: &Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    let orchestrator = app.sync_orchestrator()?;

    orchestrator.announce().await?;
    println!(
        "{} Webhook registered: {}",
        style("✓").green(),
        settings.webhook_url()
    );
    Ok(())
}

/// Test the connection and record the time of success.
pub async fn cmd_health_check(settings: &Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings.clone()).await?;
    let orchestrator = app.sync_orchestrator()?;

    let status = orchestrator.test_connection().await;
    if status.success {
        orchestrator.health_check().await;
        println!("{} {}", style("✓").green(), status.message);
        Ok(())
    } else {
        println!("{} {}", style("✗").red(), status.message);
        Err(anyhow::anyhow!(status.message))
    }
}

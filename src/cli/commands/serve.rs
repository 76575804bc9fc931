//! Webhook server command.

use std::time::Duration;

use console::style;

use crate::app::App;
use crate::config::{Settings, WEBHOOK_PATH};
use crate::services::run_maintenance;

/// Interval between platform health checks.
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(12 * 3600);

/// Interval between maintenance passes.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Start the webhook server with its background health check and
/// maintenance tasks.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let bind = parse_bind_address(bind);

    println!("{} Running database migrations...", style("→").cyan());
    let app = match App::bootstrap(settings.clone()).await {
        Ok(app) => {
            println!("  {} Database ready", style("✓").green());
            app
        }
        Err(e) => {
            eprintln!("  {} Migration failed: {}", style("✗").red(), e);
            return Err(anyhow::anyhow!("Database migration failed: {}", e));
        }
    };

    if settings.api_key().is_none() {
        println!(
            "  {} No API key configured; deliveries will be rejected",
            style("!").yellow()
        );
    }

    spawn_health_check(app.clone());
    spawn_maintenance(app.clone());

    println!(
        "{} Listening on http://{}{}",
        style("→").cyan(),
        bind,
        WEBHOOK_PATH
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(app, &bind).await
}

fn spawn_health_check(app: App) {
    tokio::spawn(async move {
        let orchestrator = match app.sync_orchestrator() {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!("Health checks disabled: {}", e);
                return;
            }
        };
        let mut ticker = tokio::time::interval(HEALTH_CHECK_INTERVAL);
        loop {
            ticker.tick().await;
            orchestrator.health_check().await;
        }
    });
}

fn spawn_maintenance(app: App) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            ticker.tick().await;
            let seo = app.db.seo_data();
            if let Err(e) = run_maintenance(
                &seo,
                &app.log,
                app.settings.max_log_entries,
                app.settings.retention_days,
            )
            .await
            {
                tracing::warn!("Maintenance failed: {}", e);
            }
        }
    });
}

/// Parse a bind address that can be:
/// - Just a port: "8080" -> 127.0.0.1:8080
/// - Just a host: "0.0.0.0" -> 0.0.0.0:8080
/// - Host and port: "0.0.0.0:8080"
fn parse_bind_address(bind: &str) -> String {
    if let Ok(port) = bind.parse::<u16>() {
        return format!("127.0.0.1:{}", port);
    }
    if let Some((host, port)) = bind.rsplit_once(':') {
        if port.parse::<u16>().is_ok() {
            return format!("{}:{}", host, port);
        }
    }
    format!("{}:8080", bind)
}

//! Webhook server.
//!
//! The platform pushes optimizations to `POST /clickrank-ai/v1/update-post`.
//! Each delivery is rate limited per client address, authenticated with
//! the site's API key, then handed to the reconciliation engine.

mod auth;
mod client_ip;
mod handlers;
mod routes;

pub use auth::verify_bearer;
pub use client_ip::client_ip;
pub use routes::create_router;

use std::net::SocketAddr;

use crate::app::App;
use crate::config::WEBHOOK_PATH;

/// Start the webhook server.
pub async fn serve(app: App, bind: &str) -> anyhow::Result<()> {
    let router = create_router(app);

    let addr: SocketAddr = bind.parse()?;
    tracing::info!("Starting webhook server at http://{}{}", addr, WEBHOOK_PATH);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

use anyhow::Result;
use axum::serve;
use relay_server::config::RelayConfig;
use relay_server::{build_state, http::build_router};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    relay_telemetry::install("wa-slack-relay")?;

    let config = RelayConfig::from_env()?;
    let router = build_router(build_state(&config)?);
    let listener = TcpListener::bind(config.addr).await?;
    info!("wa-slack-relay listening on {}", config.addr);

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}

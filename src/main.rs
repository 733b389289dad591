use anyhow::Context;
use tokio::net::TcpListener;

use opscope::app;
use opscope::config::AppConfig;
use opscope::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_filter);
    tracing::debug!(?config, "configuration loaded");

    let provider = app::build_provider(&config).context("failed to build service provider")?;

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    app::serve(listener, provider, app::shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

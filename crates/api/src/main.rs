use std::sync::Arc;

use anyhow::Context;

use toolcrib_api::app::{self, services::AppServices};
use toolcrib_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    toolcrib_observability::init();

    let config = AppConfig::from_env().context("loading configuration")?;
    if config.webhook_secret.is_none() {
        tracing::warn!("ZAPIER_WEBHOOK_SECRET not set; /ingest accepts unauthenticated requests");
    }

    let bind_addr = config.bind_addr();
    let services = AppServices::from_config(config).context("wiring services")?;
    let app = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

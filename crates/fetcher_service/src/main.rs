use anyhow::Context;

use fetcher_logging::fetcher_info;
use fetcher_service::config::ServiceConfig;
use fetcher_service::logging::{self, LogDestination};
use fetcher_service::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::initialize(LogDestination::Terminal);

    let config = ServiceConfig::from_env();
    let router = app::build_router(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    fetcher_info!("fetcher service listening on {}", config.bind_addr);

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}

//! Reset command - clears both cache tiers and the saved session

use tracing::info;

/// Run the reset command
pub async fn run() -> anyhow::Result<()> {
    let session = super::start().await?;

    let view = session.orchestrator.reset().await;
    session.orchestrator.teardown().await;

    info!(namespace = %session.cache.namespace(), "Cache cleared");
    super::print_json(&view)
}

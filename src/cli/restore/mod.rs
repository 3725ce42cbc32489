//! Restore command - resumes the session from URL parameters or the snapshot

use clap::Args;
use serde_json::json;

use crate::domain::search::SearchParams;

/// Arguments for the restore command
#[derive(Args, Clone)]
pub struct RestoreArgs {
    /// Query string such as "company=Stripe&position=SRE&round=Onsite&searched=true"
    #[arg(long)]
    pub url: Option<String>,
}

/// Run the restore command
pub async fn run(args: RestoreArgs) -> anyhow::Result<()> {
    let session = super::start().await?;

    let params = args.url.as_deref().map(SearchParams::from_query);
    let outcome = session.restorer.restore(params).await;

    session.orchestrator.settle().await;
    let view = session.orchestrator.view().await;
    session.orchestrator.teardown().await;

    super::print_json(&json!({
        "source": outcome.source,
        "view": view,
    }))
}

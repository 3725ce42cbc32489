//! Analyze command - opens a search and prints the resulting view

use clap::Args;

/// Arguments for the analyze command
#[derive(Args, Clone)]
pub struct AnalyzeArgs {
    /// Search text, e.g. "Stripe, Backend Engineer, Onsite"
    pub query: String,

    /// Regenerate even when a valid cached entry exists
    #[arg(long)]
    pub force: bool,
}

/// Run the analyze command
pub async fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let session = super::start().await?;
    let orchestrator = &session.orchestrator;

    orchestrator.load_profile().await?;
    orchestrator.analyze_with(&args.query, args.force).await?;

    orchestrator.settle().await;
    let view = orchestrator.view().await;
    orchestrator.teardown().await;

    super::print_json(&view)
}

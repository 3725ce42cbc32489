use clap::Parser;
use prep_cache::cli::{self, Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze(args) => cli::analyze::run(args).await,
        Command::Restore(args) => cli::restore::run(args).await,
        Command::Reset => cli::reset::run().await,
    }
}

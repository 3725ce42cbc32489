//! CLI module for prep-cache
//!
//! Provides subcommands that drive one prep session:
//! - `analyze`: open a search, reusing cached content when it is still valid
//! - `restore`: pick up the session from URL parameters or the saved snapshot
//! - `reset`: clear the cache, the snapshot and the session

pub mod analyze;
pub mod reset;
pub mod restore;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::{create_session, PrepSession};

/// prep-cache - Generation cache and session engine for interview prep
#[derive(Parser)]
#[command(name = "prep-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze a search such as "Google, Software Engineer, Technical"
    Analyze(analyze::AnalyzeArgs),

    /// Restore the last session
    Restore(restore::RestoreArgs),

    /// Clear every cached entry and the saved session
    Reset,
}

/// Loads configuration, installs logging and wires a session
async fn start() -> anyhow::Result<PrepSession> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&logging::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.clone(),
    });

    create_session(&config).await
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

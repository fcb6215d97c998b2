//! # plog CLI
//!
//! Command-line interface for rendering a markdown tree into component
//! documents.

mod commands;
mod scheduler;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "plog.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every markdown document once
    Build,

    /// Render, then render again whenever the markdown tree changes
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build => {
            let summary = commands::build_site(&cli.config)?;
            println!(
                "Rendered {} documents in {} directories",
                summary.documents, summary.directories
            );
            Ok(())
        }
        Commands::Watch => commands::watch_site(&cli.config).await,
    }
}

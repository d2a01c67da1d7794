use clap::{Parser, Subcommand};

mod commands;

use commands::{BuildArgs, CheckSourcesArgs};

#[derive(Parser)]
#[command(name = "optionset")]
#[command(about = "Builds a model-ready options pricing dataset from market data tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge sources, derive features, split and write the dataset
    Build(BuildArgs),
    /// Load every source table and report its coverage
    CheckSources(CheckSourcesArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Build(args) => commands::run_build(args)?,
        Commands::CheckSources(args) => commands::run_check_sources(args)?,
    }

    Ok(())
}

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "harvest")]
#[command(about = "Locator-driven catalog extraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract records for every scenario of a supplier
    Run {
        /// Supplier catalog name (`<suppliers_dir>/<supplier>.yaml`)
        #[arg(long)]
        supplier: String,

        /// JSON scenario document to run instead of the discovered ones
        #[arg(long)]
        scenario_file: Option<PathBuf>,

        /// List the scenarios that would run without starting a browser
        #[arg(long)]
        dry_run: bool,
    },
    /// Load and validate a supplier catalog
    Validate {
        #[arg(long)]
        supplier: String,
    },
    /// List the scenarios discovered for a supplier
    Scenarios {
        #[arg(long)]
        supplier: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = harvest_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            supplier,
            scenario_file,
            dry_run,
        } => commands::run_harvest(&config, &supplier, scenario_file.as_deref(), dry_run).await,
        Commands::Validate { supplier } => commands::run_validate(&config, &supplier),
        Commands::Scenarios { supplier } => commands::run_list_scenarios(&config, &supplier),
    }
}

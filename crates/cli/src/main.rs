use clap::{Parser, Subcommand};
use sentistock_core::{ConfigLoader, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;

mod commands;

use commands::{BackfillArgs, PredictArgs, RunArgs, TrainArgs, UpdateArgs};

#[derive(Parser)]
#[command(name = "sentistock")]
#[command(about = "Daily news sentiment and stock movement pipeline", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect one day's news and prices and append them to the history
    Update(UpdateArgs),
    /// Run the daily update for a range of past dates
    Backfill(BackfillArgs),
    /// Evaluate the model grid and persist the best model per window
    Train(TrainArgs),
    /// Predict the next day's movement with the persisted models
    Predict(PredictArgs),
    /// Update, train and predict in one go
    Run(RunArgs),
    /// Run the daily cycle on the configured cron schedule (daemon mode)
    Schedule,
    /// Show stored snapshots and model artifacts
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ConfigLoader::load_from(&cli.config)?;
    tracing::debug!(config = %cli.config.display(), "Loaded configuration");

    match cli.command {
        Commands::Update(args) => commands::run_update(config, args).await?,
        Commands::Backfill(args) => commands::run_backfill(config, args).await?,
        Commands::Train(args) => commands::run_train(config, args).await?,
        Commands::Predict(args) => commands::run_predict(config, args)?,
        Commands::Run(args) => commands::run_cycle(config, args).await?,
        Commands::Schedule => commands::run_schedule(config).await?,
        Commands::Status => commands::run_status(&config)?,
    }

    Ok(())
}

mod analytics;
mod report;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use hfmon_core::{Channel, Granularity};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hfmon-cli")]
#[command(about = "hfmon media monitoring command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Granularity, keywords and channels shared by every analytics command.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub(crate) struct ScopeArgs {
    /// Bucket width: daily, weekly, monthly, quarterly or yearly
    #[arg(long, default_value = "monthly")]
    pub granularity: Granularity,

    /// Keyword to analyze (repeatable); defaults to the watchlist keywords
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Channel to include (repeatable); defaults to news, youtube and dc
    #[arg(long = "channel")]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect mentions from live sources and aggregate them
    Collect {
        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the window, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        #[command(flatten)]
        scope: ScopeArgs,

        /// DC gallery id from the watchlist (repeatable); defaults to every enabled gallery
        #[arg(long = "gallery")]
        galleries: Vec<String>,

        /// Ignore any cached result for this request
        #[arg(long)]
        force_refresh: bool,

        /// Print the raw analytics result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Aggregate seeded synthetic documents
    Demo {
        #[arg(long, default_value = "2024-01-01")]
        start: NaiveDate,

        #[arg(long, default_value = "2024-12-31")]
        end: NaiveDate,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Seed for the synthetic document generator
        #[arg(long, default_value_t = hfmon_analytics::demo::DEFAULT_SEED)]
        seed: u64,

        #[arg(long)]
        json: bool,
    },
    /// Summarize a saved analytics result
    Summary {
        /// Analytics JSON, either bare or wrapped in an API `{data}` envelope
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Print the cache fingerprint for a request
    Fingerprint {
        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,

        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = hfmon_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Collect {
            start,
            end,
            scope,
            galleries,
            force_refresh,
            json,
        } => {
            analytics::run_collect(&config, start, end, &scope, &galleries, force_refresh, json)
                .await
        }
        Commands::Demo {
            start,
            end,
            scope,
            seed,
            json,
        } => analytics::run_demo(&config, start, end, &scope, seed, json),
        Commands::Summary { input, json } => analytics::run_summary(&input, json),
        Commands::Fingerprint { start, end, scope } => {
            analytics::run_fingerprint(&config, start, end, &scope)
        }
    }
}

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fieldops", version, about = "Farm irrigation advisory client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Skip cached entries and fetch from the backend
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Keep the cache in memory for this run only
    #[arg(long, global = true)]
    pub no_cache: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-run interactive setup
    Init,
    /// Validate config and test the backend connection
    Check,
    /// Irrigation recommendation for one field
    Recommend(RecommendArgs),
    /// Recommendations for several fields at once
    Batch(BatchArgs),
    /// Seven-day irrigation schedule for one field
    Weekly(WeeklyArgs),
    /// Farm summary (default when no command is given)
    Dashboard(DashboardArgs),
    /// List the farm's fields
    Fields,
    /// Manage the local cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Args)]
pub struct RecommendArgs {
    pub field_id: i64,

    /// Leave out the forecast window
    #[arg(long)]
    pub no_forecast: bool,

    /// Forecast length in days (defaults to api.forecast_days)
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Args)]
pub struct BatchArgs {
    #[arg(required = true, num_args = 1..)]
    pub field_ids: Vec<i64>,

    /// Day to compute recommendations for (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Args)]
pub struct WeeklyArgs {
    pub field_id: i64,

    /// First day of the schedule (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
}

#[derive(Args, Default)]
pub struct DashboardArgs {
    /// Field ids (defaults to farm.field_ids, then every field)
    pub field_ids: Vec<i64>,

    /// Day to compute recommendations for (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Remove cached entries
    Clear {
        /// Only entries that include this field
        #[arg(long)]
        field: Option<i64>,
    },
    /// List cached entries
    List,
}

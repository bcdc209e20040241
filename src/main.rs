mod commands;
mod config;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use commands::mark::Action;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "streak")]
#[command(about = "Keep a streak of days in a Google calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Streak calendar name [default: Streaks]
    #[arg(long = "cal", global = true)]
    calendar: Option<String>,

    /// Streak event name [default: Streak]
    #[arg(long, global = true)]
    event: Option<String>,

    /// Create calendar if missing
    #[arg(long, global = true)]
    create: bool,

    /// Authentication token cache file
    #[arg(long = "cachefile", global = true)]
    cache_file: Option<String>,

    /// Log every record visited and every change made
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a day to the streak
    Add(DayArgs),
    /// Remove a day from the streak
    Remove(DayArgs),
    /// Show the longest streak
    Longest,
    /// Authenticate with Google and cache the tokens
    Auth,
}

#[derive(Args)]
struct DayArgs {
    /// Day offset from today (e.g. -1 for yesterday)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true, conflicts_with = "date")]
    offset: i64,

    /// Exact day (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl DayArgs {
    fn day(&self) -> Result<NaiveDate> {
        commands::target_day(self.date, self.offset, Local::now().date_naive())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    let settings = config::load_config()?.settings(config::Overrides {
        calendar: cli.calendar,
        event: cli.event,
        create: cli.create,
        token_cache: cli.cache_file,
    })?;

    match cli.command {
        Commands::Add(args) => commands::mark::run(&settings, Action::Add, args.day()?).await,
        Commands::Remove(args) => {
            commands::mark::run(&settings, Action::Remove, args.day()?).await
        }
        Commands::Longest => commands::longest::run(&settings).await,
        Commands::Auth => commands::auth::run(&settings).await,
    }
}

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use kino_showings::apis::kino::parse_feed;
use kino_showings::app::ports::MovieLookupPort;
use kino_showings::config::Config;
use kino_showings::domain::CanonicalMovie;
use kino_showings::infra::lookup::{HttpMovieLookup, OfflineLookup};
use kino_showings::logging;
use kino_showings::pipeline::{live_http, MovieShowingsPipeline, Reconciler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "kino-showings")]
#[command(about = "Cinema showtime feed reconciliation and enrichment")]
#[command(version)]
struct Cli {
    /// Directory for the rolling JSON log file
    #[arg(long, global = true, default_value = "logs")]
    log_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the live feed, enrich it and print the sorted movie list
    Run {
        /// Path to a TOML config file (defaults to ./config.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Reconcile a saved feed file
    Process {
        /// Saved feed JSON
        #[arg(long)]
        input: PathBuf,
        /// Skip all external lookups
        #[arg(long)]
        offline: bool,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn write_output(movies: &[CanonicalMovie], output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(movies)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), movies = movies.len(), "Wrote movie list");
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli.log_dir);

    match cli.command {
        Commands::Run { config, output } => {
            let config = Config::load(config.as_deref()).context("loading configuration")?;
            let pipeline = MovieShowingsPipeline::from_config(&config)?;
            let movies = pipeline.run().await;
            write_output(&movies, output.as_deref())?;
        }
        Commands::Process {
            input,
            offline,
            config,
            output,
        } => {
            let config = Config::load(config.as_deref()).context("loading configuration")?;
            let bytes = std::fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let feed = parse_feed(&bytes).with_context(|| format!("parsing {}", input.display()))?;

            let lookup: Arc<dyn MovieLookupPort> = if offline {
                Arc::new(OfflineLookup)
            } else {
                Arc::new(HttpMovieLookup::new(live_http(&config)?, config.tmdb_credential()))
            };
            let reconciler = Reconciler::new(lookup, &config.enrichment);
            let movies = reconciler.reconcile_sorted(&feed, Local::now().naive_local()).await;
            write_output(&movies, output.as_deref())?;
        }
    }
    Ok(())
}

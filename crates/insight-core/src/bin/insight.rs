//! insight - conflict insight generator
//!
//! Usage:
//!   insight analyze --input data/raw --output data/processed
//!   insight analyze --input feed.json --config thresholds.json
//!   insight notes --input data/raw --novelty-index data/.novelty_index.json

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use insight_core::notes::{annotate_novelty, notes_json};
use insight_core::{
    InsightConfig, InsightEngine, InsightReport, JsonNoveltyStore, NoveltyIndex, Result,
    load_feed, strategic_notes,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "insight")]
#[command(about = "Profiles, hotspots and strategic alerts from conflict-event feeds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an insight snapshot and save it as JSON
    Analyze {
        /// Feed file, or a directory holding conflict_*.json feeds
        #[arg(short, long, default_value = "data/raw")]
        input: PathBuf,

        /// Directory the snapshot is written to
        #[arg(short, long, default_value = "data/processed")]
        output: PathBuf,

        /// JSON file overriding analysis thresholds
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print strategic development notes as JSON
    Notes {
        /// Feed file, or a directory holding conflict_*.json feeds
        #[arg(short, long, default_value = "data/raw")]
        input: PathBuf,

        /// Rolling novelty index to score notes against (updated in place)
        #[arg(long)]
        novelty_index: Option<PathBuf>,

        /// JSON file overriding the note keywords
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Analyze {
            input,
            output,
            config,
        } => run_analyze(input, output, config),
        Commands::Notes {
            input,
            novelty_index,
            config,
        } => run_notes(input, novelty_index, config),
    };

    if let Err(e) = outcome {
        if e.is_data_not_found() {
            error!(error = %e, "No conflict data available");
        } else {
            error!(error = %e, "Insight run failed");
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<InsightConfig> {
    match path {
        Some(path) => {
            let config = InsightConfig::from_file(&path)?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        None => Ok(InsightConfig::default()),
    }
}

fn run_analyze(input: PathBuf, output: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let engine = InsightEngine::new(load_config(config)?);

    match engine.load_and_analyze(&input)? {
        InsightReport::NoEvents { skipped } => {
            info!(skipped, "Feed contains no valid events, nothing written");
        }
        InsightReport::Snapshot(snapshot) => {
            let path = snapshot.write_to_dir(&output)?;
            info!(
                path = %path.display(),
                events = snapshot.metadata.total_events,
                fatalities = snapshot.metadata.total_fatalities,
                countries = snapshot.metadata.countries_covered.len(),
                hotspots = snapshot.hotspots.len(),
                alerts = snapshot.strategic_alerts.len(),
                "Insights generated"
            );
        }
    }
    Ok(())
}

fn run_notes(input: PathBuf, novelty_index: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    let feed = load_feed(&input)?;
    let mut notes = strategic_notes(&feed.events, &config.notes);

    if let Some(path) = novelty_index {
        let mut index = NoveltyIndex::new(JsonNoveltyStore::open(&path)?);
        annotate_novelty(&mut notes, &mut index, Local::now().date_naive());
        index.store().save()?;
    }

    println!("{}", notes_json(&notes)?);
    Ok(())
}

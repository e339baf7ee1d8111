//! insight-sim - synthetic conflict feed generator
//!
//! Usage:
//!   insight-sim generate --seed 7 --days 180 --out data/raw/conflict_sim.json
//!   insight-sim generate --scenarios emerging_hotspot,new_actor
//!   insight-sim list

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use insight_sim::{FeedGenerator, Scenario, raw_feed};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "insight-sim")]
#[command(about = "Synthetic conflict-event feeds with injected anomaly scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a feed file
    Generate {
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// First day of the feed (YYYY-MM-DD)
        #[arg(long, default_value = "2025-01-01")]
        start: NaiveDate,

        /// Number of days to cover
        #[arg(short, long, default_value = "180")]
        days: u32,

        /// Mean background events per day
        #[arg(long, default_value = "6.0")]
        rate: f64,

        /// Scenarios to inject (comma-separated)
        #[arg(long)]
        scenarios: Option<String>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List available scenarios and the alert each one provokes
    List,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            seed,
            start,
            days,
            rate,
            scenarios,
            out,
        } => {
            if let Err(e) = run_generate(seed, start, days, rate, scenarios, out) {
                error!(error = %e, "Feed generation failed");
                std::process::exit(1);
            }
        }
        Commands::List => run_list(),
    }
}

fn run_generate(
    seed: u64,
    start: NaiveDate,
    days: u32,
    rate: f64,
    scenarios: Option<String>,
    out: Option<PathBuf>,
) -> std::io::Result<()> {
    let mut generator = FeedGenerator::new(seed, start, days).with_daily_rate(rate);

    if let Some(list) = scenarios {
        for name in list.split(',').filter(|n| !n.trim().is_empty()) {
            match Scenario::from_name(name) {
                Some(scenario) => generator = generator.inject(scenario),
                None => warn!(scenario = name.trim(), "Unknown scenario, skipping"),
            }
        }
    }

    let events = generator.generate();
    let body = serde_json::to_string_pretty(&raw_feed(&events))?;

    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, body)?;
            info!(
                path = %path.display(),
                events = events.len(),
                scenarios = generator.scenarios().len(),
                "Wrote synthetic feed"
            );
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn run_list() {
    for scenario in Scenario::ALL {
        let truth = scenario.ground_truth();
        println!(
            "{:<18} {:?} in {}{}",
            scenario.name(),
            truth.kind,
            truth.country,
            truth.location.map(|l| format!(" / {l}")).unwrap_or_default()
        );
    }
}

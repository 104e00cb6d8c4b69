//! Seismic Review CLI Application
//!
//! Command-line review gateway over the seismic-review-core library:
//! - Lists events pending review
//! - Locks an event for the acting analyst
//! - Edits magnitude, scope and origin
//! - Registers the analyst's decision (confirm, reject, escalate)
//! - Shows the persisted state history

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seismic_review_core::{
    Actor, DetectedEvent, EditInput, ReviewEngine, ReviewService, SqliteEventStore,
};
use std::fs;
use std::path::PathBuf;

mod config;
mod report;

use config::AppConfig;

/// Built-in demo events (the three sample detections)
const DEMO_EVENTS: &str = include_str!("../data/demo_events.json");

/// Seismic Review - Manual review of automatically detected seismic events
#[derive(Parser, Debug)]
#[command(name = "seismic-review")]
#[command(about = "Manual review of automatically detected seismic events", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the SQLite database (overrides config)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Name of the acting analyst (overrides config)
    #[arg(short, long, value_name = "NAME")]
    analyst: Option<String>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List events waiting for review
    Pending,
    /// Show one event
    Show {
        id: i64,
        /// Print the event as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open an event for review (locks it if unreviewed)
    Lock { id: i64 },
    /// Replace magnitude, scope and origin (all three required)
    Edit {
        id: i64,
        #[arg(long, default_value = "")]
        magnitude: String,
        #[arg(long, default_value = "")]
        scope: String,
        #[arg(long, default_value = "")]
        origin: String,
    },
    /// Register a decision: Confirmar, Rechazar or SolicitarExperto
    Act { id: i64, action: String },
    /// Abandon the review and return the event to AutoDetected
    Cancel { id: i64 },
    /// Show the state history of an event
    History { id: i64 },
    /// Store the built-in demo events
    Seed,
    /// Store detected events from a JSON file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::debug!("Seismic Review CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using core library v{}", seismic_review_core::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    let db_path = args.db.clone().unwrap_or_else(|| config.database.path.clone());
    let store = SqliteEventStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {:?}", db_path))?;
    let mut service = ReviewService::new(ReviewEngine::with_config(config.review.clone()), store);

    run(&args, &config, &mut service)
}

fn run(args: &Args, config: &AppConfig, service: &mut ReviewService<SqliteEventStore>) -> Result<()> {
    match &args.command {
        Command::Pending => {
            let events = service.pending_events()?;
            print!("{}", report::pending_list(&events));
        }
        Command::Show { id, json } => {
            let event = service.event(*id)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                print!("{}", report::event_detail(&event));
            }
        }
        Command::Lock { id } => {
            let actor = acting_analyst(args, config)?;
            let event = service
                .select_event(*id, &actor)
                .with_context(|| format!("Cannot open event {} for review", id))?;
            print!("{}", report::event_detail(&event));
        }
        Command::Edit { id, magnitude, scope, origin } => {
            let event = service
                .update_event_data(*id, EditInput::new(magnitude.as_str(), scope.as_str(), origin.as_str()))
                .with_context(|| format!("Cannot update event {}", id))?;
            print!("{}", report::event_detail(&event));
        }
        Command::Act { id, action } => {
            let actor = acting_analyst(args, config)?;
            let event = service
                .register_action(*id, action, &actor)
                .with_context(|| format!("Cannot register '{}' for event {}", action, id))?;
            println!("Event #{} is now {}", event.id(), event.state());
        }
        Command::Cancel { id } => {
            let event = service
                .cancel(*id)
                .with_context(|| format!("Cannot cancel review of event {}", id))?;
            println!("Event #{} is now {}", event.id(), event.state());
        }
        Command::History { id } => {
            let ledger = service.history(*id)?;
            print!("{}", report::history(*id, &ledger));
        }
        Command::Seed => {
            let records: Vec<DetectedEvent> =
                serde_json::from_str(DEMO_EVENTS).context("Built-in demo events are invalid")?;
            let summary = service.import_events(records)?;
            print!("{}", report::import_summary(&summary));
        }
        Command::Import { file } => {
            let content = fs::read_to_string(file)
                .with_context(|| format!("Failed to read event file: {:?}", file))?;
            let records: Vec<DetectedEvent> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse event file: {:?}", file))?;
            let summary = service.import_events(records)?;
            print!("{}", report::import_summary(&summary));
        }
    }
    Ok(())
}

/// Resolve the analyst from the command line, then from the config file
fn acting_analyst(args: &Args, config: &AppConfig) -> Result<Actor> {
    if let Some(name) = args.analyst.as_deref().map(str::trim).filter(|name| !name.is_empty()) {
        return Ok(Actor::analyst(name));
    }
    config
        .analyst
        .as_ref()
        .map(|analyst| analyst.to_actor())
        .context("No analyst given: use --analyst or set [analyst] in the config file")
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_events_parse() {
        let records: Vec<DetectedEvent> = serde_json::from_str(DEMO_EVENTS).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![23, 24, 25]);
        for record in records {
            assert!(record.into_event().is_ok());
        }
    }

    #[test]
    fn test_analyst_flag_overrides_config() {
        let config: AppConfig = toml::from_str("[analyst]\nname = \"Config Analyst\"\n").unwrap();

        let args = Args::parse_from(["seismic-review", "--analyst", "Flag Analyst", "pending"]);
        assert_eq!(acting_analyst(&args, &config).unwrap().name, "Flag Analyst");

        let args = Args::parse_from(["seismic-review", "pending"]);
        assert_eq!(acting_analyst(&args, &config).unwrap().name, "Config Analyst");

        assert!(acting_analyst(&args, &AppConfig::default()).is_err());
    }
}

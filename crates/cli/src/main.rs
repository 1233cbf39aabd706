use crate::error::CliError;
use clap::Parser;
use commands::Commands;
use engine::{
    chunk::chunk_fields,
    config::SyncSettings,
    resolver::{DefaultEndDateResolver, EndDateResolver},
    state::{MemoryStateStore, SledStateStore, StateStore},
    sync::SyncEngine,
    windows::WindowIter,
};
use model::{fields::FieldCatalog, partition::Partition};
use std::sync::Arc;
use tracing::{Level, info};
use transport::requester::HttpRequester;

mod commands;
mod error;
mod output;

/// Versioned API headers sent with every request.
const API_VERSION: &str = "202404";
const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";

#[derive(Parser)]
#[command(name = "adsync", version = "0.1.0", about = "Ad analytics sync tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), CliError> {
    // Initialize logger
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { config, output } => {
            let settings = load_settings(&config)?;
            run_sync(settings, output)?;
        }
        Commands::Validate { config } => {
            let settings = load_settings(&config)?;
            print_plan(&settings);
        }
        Commands::Fields { json } => {
            let catalog = FieldCatalog::default_catalog();
            if json {
                let listing = serde_json::to_string_pretty(catalog.fields())
                    .map_err(CliError::JsonSerialize)?;
                println!("{listing}");
            } else {
                for field in catalog.fields() {
                    println!("{field}");
                }
            }
        }
    }

    Ok(())
}

fn load_settings(path: &str) -> Result<Arc<SyncSettings>, CliError> {
    let source = std::fs::read_to_string(path)?;
    Ok(Arc::new(SyncSettings::from_json(&source)?))
}

fn run_sync(settings: Arc<SyncSettings>, output: Option<String>) -> Result<(), CliError> {
    let requester = HttpRequester::from_env(&settings.token_env)?
        .with_header("LinkedIn-Version", API_VERSION)
        .with_header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION);

    let state: Arc<dyn StateStore> = match &settings.state_dir {
        Some(dir) => Arc::new(SledStateStore::open(dir)?),
        None => {
            info!("no state_dir configured, cursors will not survive this run");
            Arc::new(MemoryStateStore::new())
        }
    };

    let mut sink = output::JsonLinesSink::create(output.as_deref())?;
    let mut engine = SyncEngine::new(settings, Arc::new(requester), state)?;
    let report = engine.run(&mut sink)?;
    sink.flush()?;

    info!(
        partitions = report.partitions,
        slices = report.slices,
        records = report.records,
        "sync complete"
    );
    Ok(())
}

/// Dry-run summary: how the configured range and catalog will be split.
fn print_plan(settings: &SyncSettings) {
    let chunks = chunk_fields(&settings.catalog);
    let resolver = DefaultEndDateResolver::new(settings.end_date, settings.timezone);
    let end = resolver.resolve(&Partition::new());
    let windows: Vec<_> =
        WindowIter::new(settings.start_date, end, settings.step, &settings.catalog).collect();

    println!("Sync plan for account {}:", settings.account_id);
    println!("-----------------------------");
    println!("{:<16} {}", "Fields", settings.catalog.len());
    println!("{:<16} {}", "Chunk size", settings.catalog.chunk_size());
    println!("{:<16} {}", "Chunks", chunks.len());
    println!("{:<16} {}", "Step", settings.step);
    println!("{:<16} {}", "Start", settings.start_date);
    println!("{:<16} {}", "End", end);
    println!("{:<16} {}", "Windows", windows.len());
    println!("{:<16} {}", "Requests", windows.len() * chunks.len());

    for slice in windows.iter().take(3) {
        println!("  {}", slice.window);
    }
    if windows.len() > 3 {
        println!("  ... and {} more", windows.len() - 3);
    }
}

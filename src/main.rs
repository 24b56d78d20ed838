mod config;
mod error;
mod export;
mod extractor;
mod model;
mod normalize;
mod store;
mod uploader;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use config::Settings;
use extractor::{HttpSource, RetryPolicy, StopReason};
use model::CombinedPayload;
use normalize::Normalizer;
use store::{DocumentStore, MemoryStore, SqliteStore};
use uploader::UploadStats;

#[derive(Parser)]
#[command(name = "jeju_places", about = "Visit Jeju place extractor and loader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every page from the source API into the JSON and CSV files
    Fetch {
        /// Source locale (kr, en, ...)
        #[arg(short, long)]
        locale: Option<String>,
    },
    /// Normalize the fetched items and upsert them into the store
    Upload {
        /// Combined payload to read (default: configured data_path)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Items per atomic batch
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// Upload into a throwaway in-memory store and only report counts
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch + upload in one go
    Run {
        #[arg(short, long)]
        locale: Option<String>,
        #[arg(short, long)]
        batch_size: Option<usize>,
    },
    /// Show store statistics
    Stats,
    /// Print one stored place as JSON
    Show {
        place_id: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(settings = ?settings, "Starting jeju_places");

    let result = match cli.command {
        Commands::Fetch { locale } => {
            let locale = locale.unwrap_or_else(|| settings.locale.clone());
            fetch(&settings, &locale).map(|_| ())
        }
        Commands::Upload {
            input,
            batch_size,
            dry_run,
        } => {
            let input = input.unwrap_or_else(|| settings.data_path.clone());
            let batch_size = batch_size.unwrap_or(settings.batch_size);
            let payload = export::read_payload(&input)?;
            println!("Loaded {} items from {:?}", payload.items.len(), input);
            if dry_run {
                let mut store = MemoryStore::new();
                let stats = upload(&settings, &mut store, &payload, batch_size);
                println!("Dry run: {} batches committed in memory", store.commits());
                print_upload(&stats);
                Ok(())
            } else {
                let mut store = open_store(&settings.db_path)?;
                let stats = upload(&settings, &mut store, &payload, batch_size);
                print_upload(&stats);
                Ok(())
            }
        }
        Commands::Run { locale, batch_size } => {
            let locale = locale.unwrap_or_else(|| settings.locale.clone());
            let batch_size = batch_size.unwrap_or(settings.batch_size);

            let t_fetch = Instant::now();
            let payload = fetch(&settings, &locale)?;
            println!("Fetched in {:.1}s", t_fetch.elapsed().as_secs_f64());
            if payload.items.is_empty() {
                println!("Nothing to upload.");
                return Ok(());
            }

            let t_upload = Instant::now();
            let mut store = open_store(&settings.db_path)?;
            let stats = upload(&settings, &mut store, &payload, batch_size);
            println!("Uploaded in {:.1}s", t_upload.elapsed().as_secs_f64());
            print_upload(&stats);
            Ok(())
        }
        Commands::Stats => {
            let store = open_store(&settings.db_path)?;
            print_stats(&store, &settings.collection)
        }
        Commands::Show { place_id } => {
            let store = open_store(&settings.db_path)?;
            match store.get(&settings.collection, &place_id)? {
                Some(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
                None => println!("No place '{}' in '{}'.", place_id, settings.collection),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Extract every page and write the JSON payload plus the CSV export.
fn fetch(settings: &Settings, locale: &str) -> Result<CombinedPayload> {
    let source = HttpSource::new(settings)?;
    let policy = RetryPolicy::from_settings(settings);

    println!("Fetching locale '{}' from the source API...", locale);
    let extraction = extractor::collect_all(&source, locale, &policy);
    match extraction.stop {
        StopReason::FetchFailed => println!(
            "Stopped after page {} failed repeatedly; the data may be incomplete.",
            extraction.pages + 1
        ),
        StopReason::Exhausted | StopReason::TotalReached => {
            println!("Collected {} items from {} pages.", extraction.items.len(), extraction.pages)
        }
    }
    if let Some(total) = extraction.reported_total {
        println!("Source reports {} items in total.", total);
    }

    let payload = CombinedPayload::from_items(extraction.items);
    if payload.items.is_empty() {
        println!("No items collected; nothing written.");
        return Ok(payload);
    }

    export::write_payload(&settings.data_path, &payload)?;
    println!("Wrote {:?} ({} items)", settings.data_path, payload.total_items);
    let rows = export::write_csv(&settings.csv_path, &payload.items)?;
    println!("Wrote {:?} ({} rows)", settings.csv_path, rows);
    Ok(payload)
}

fn upload(
    settings: &Settings,
    store: &mut dyn DocumentStore,
    payload: &CombinedPayload,
    batch_size: usize,
) -> UploadStats {
    println!(
        "Uploading {} items to '{}' in batches of {}...",
        payload.items.len(),
        settings.collection,
        batch_size
    );
    uploader::upload(
        store,
        &settings.collection,
        &payload.items,
        batch_size,
        &Normalizer::default(),
    )
}

fn open_store(path: &Path) -> Result<SqliteStore> {
    let store = SqliteStore::open(path)?;
    println!("Database: {:?}", path);
    Ok(store)
}

fn print_upload(stats: &UploadStats) {
    println!("\nUpload complete!");
    println!("Succeeded: {}", stats.success);
    println!("Failed:    {}", stats.errors);
    if stats.failed_batches > 0 {
        println!(
            "Batches:   {} ({} failed to commit)",
            stats.batches, stats.failed_batches
        );
    }
}

fn print_stats(store: &SqliteStore, collection: &str) -> Result<()> {
    let total = store
        .count(collection)
        .with_context(|| format!("Failed to count '{}'", collection))?;
    println!("Places in '{}': {}", collection, total);
    if total == 0 {
        return Ok(());
    }

    println!("\n--- Regions ---");
    for (region, n) in store.region_counts(collection)? {
        println!("  {:<24} {:>6}", region.as_deref().unwrap_or("(none)"), n);
    }

    println!("\n--- Categories ---");
    for (category, n) in store.category_counts(collection)? {
        println!("  {:<24} {:>6}", category, n);
    }
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, secs % 3600 / 60, secs % 60) {
        (0, 0, _) => format!("{:.1}s", d.as_secs_f64()),
        (0, m, s) => format!("{m}m {s:02}s"),
        (h, m, s) => format!("{h}h {m:02}m {s:02}s"),
    }
}

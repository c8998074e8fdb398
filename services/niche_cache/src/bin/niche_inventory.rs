//! Niche inventory - inspect niche options and usage from a JSON fixture
//!
//! Usage:
//!   niche_inventory --form listings
//!   niche_inventory --form listings --search seo --niche SEO --niche Tech
//!   niche_inventory --fixture ./data/niche_fixture.json --json

use anyhow::{Context, Result};
use clap::Parser;
use invalidation_bus::{BroadcastFeed, InvalidationBus};
use niche_cache::{JsonFileStore, NicheOptionCache};
use niche_config::{LoggingSettings, NicheSettings};
use niche_filter::{search_filter, NicheReport};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "niche_inventory")]
#[command(about = "List configured niche options and how often records use them")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay name (config/environments/<env>.toml)
    #[arg(short, long)]
    env: Option<String>,

    /// Fixture file; overrides store.fixture_path
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// Form whose records are counted
    #[arg(long)]
    form: Option<String>,

    /// Case-insensitive search over options and counts
    #[arg(short, long, default_value = "")]
    search: String,

    /// Selected niche for record matching (repeatable)
    #[arg(short, long = "niche")]
    niches: Vec<String>,

    /// Print a single JSON document instead of text
    #[arg(long)]
    json: bool,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = NicheSettings::load(args.config.as_deref(), args.env.as_deref())?;
    settings.expand_env_vars()?;
    if let Some(fixture) = &args.fixture {
        settings.store.fixture_path = fixture.clone();
    }

    init_logging(&settings.logging, args.json_logs)?;
    info!(fixture = %settings.store.fixture_path.display(), "Starting niche inventory");

    let store = Arc::new(JsonFileStore::new(&settings.store.fixture_path));
    let feed = Arc::new(BroadcastFeed::new(settings.bus.broadcast_capacity));
    let bus = InvalidationBus::new(feed, settings.bus.topic.clone());
    let cache = NicheOptionCache::with_bus(store.clone(), &settings.cache, &bus).await;

    let options = cache.get_all_options().await;
    let options = search_filter(options.as_slice(), &args.search);

    let (counts, matching) = match &args.form {
        Some(form) => {
            let report = NicheReport::new(store.clone(), store.clone());
            let counts = report.counts(form, &args.search).await;
            let matching = if args.niches.is_empty() {
                Vec::new()
            } else {
                report.matching_records(form, args.niches.as_slice()).await
            };
            (counts, matching)
        }
        None => {
            if !args.niches.is_empty() {
                warn!("--niche given without --form, skipping record matching");
            }
            (Vec::new(), Vec::new())
        }
    };

    if args.json {
        let document = json!({
            "options": options,
            "counts": counts,
            "matching_records": matching.iter().map(|r| &r.id).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&document).context("Failed to encode report")?
        );
    } else {
        println!("Options ({}):", options.len());
        for option in &options {
            match &option.icon {
                Some(icon) => println!("  {} [{}]", option.text, icon),
                None => println!("  {}", option.text),
            }
        }

        if let Some(form) = &args.form {
            println!("\nUsage in {}:", form);
            for count in &counts {
                println!("  {:<24} {}", count.option.text, count.count);
            }

            if !args.niches.is_empty() {
                println!("\nRecords matching {}:", args.niches.join(", "));
                for record in &matching {
                    println!("  {}", record.id);
                }
            }
        }
    }

    cache.destroy().await;
    Ok(())
}

fn init_logging(logging: &LoggingSettings, json_logs: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    // Logs go to stderr so stdout stays parseable with --json
    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

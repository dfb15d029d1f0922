//! inaturalist-photos - print fresh specimen photo URLs for a taxon
//!
//! Pages through research-grade iNaturalist observations, one batch per
//! round, carrying the cursor from each batch into the next.

mod error;

use clap::Parser;
use inaturalist_photos::{build_http_client, ImageBatch, InatConfig, PhotoSource};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::error::{CliError, Result};

#[derive(Parser, Debug)]
#[command(name = "inaturalist-photos", version, about)]
struct Args {
    /// Taxon name, e.g. "Vanessa atalanta"
    taxon: String,

    /// Id of the last observation already seen (0 starts from the beginning)
    #[arg(long, default_value_t = 0)]
    cursor: u64,

    /// Observations per request (defaults to INAT_PER_PAGE or 5)
    #[arg(long)]
    count: Option<u32>,

    /// Number of consecutive batches to fetch
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Print each batch as a JSON object instead of tab-separated lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("inaturalist_photos=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let args = Args::parse();
    if args.count == Some(0) {
        return Err(CliError::Config("--count must be at least 1".to_string()));
    }

    let config = InatConfig::from_env();
    info!("API: {}", config.api_base_url);
    info!("Images: {}", config.image_base_url);

    let count = args.count.unwrap_or(config.default_count);
    let http = build_http_client(&config)?;
    let source = PhotoSource::new(config);

    let mut cursor = args.cursor;
    for round in 1..=args.rounds {
        let batch = source
            .fetch_with_count(&http, &args.taxon, cursor, count)
            .await?;
        info!(
            round,
            photos = batch.len(),
            cursor = batch.cursor,
            "Fetched batch"
        );

        print_batch(&batch, args.json)?;

        match next_cursor(&batch) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    let stats = source.resolver().cache_stats();
    info!(hits = stats.hits, misses = stats.misses, "Taxon cache");

    Ok(())
}

/// Cursor for the following round, or `None` once the taxon has nothing left
///
/// A page of observations without photos still moves the cursor forward.
fn next_cursor(batch: &ImageBatch) -> Option<u64> {
    (batch.cursor != 0).then_some(batch.cursor)
}

fn print_batch(batch: &ImageBatch, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(batch)?);
    } else {
        for (url, observation_id) in batch.iter() {
            println!("{}\t{}", observation_id, url);
        }
    }
    Ok(())
}

//! Register base anime series from already-fetched Jikan `/top/anime` pages.
//!
//! Usage: import-anime <catalog.sqlite3> <page-1.json> [page-2.json ...]
//!
//! Pages are processed in the order given. Fetching (and its rate limiting)
//! is done by a separate tool; this binary only reads the JSON responses.

use anime_catalog::config::CatalogConfig;
use anime_catalog::ingest::IngestionRun;
use anime_catalog::models::{FeedEntry, FeedPage, IngestDecision, IngestStats};
use anime_catalog::progress::{create_progress_bar, format_duration, log_progress, set_log_only};
use anime_catalog::store::SqliteCatalog;
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "import-anime")]
#[command(about = "Import base anime series from Jikan page dumps into the catalog")]
struct Args {
    /// Catalog SQLite database
    db: PathBuf,

    /// Jikan response files, in page order
    #[arg(required = true)]
    pages: Vec<PathBuf>,

    /// TOML file with ingestion options and extra variant patterns
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `feed.max_pages` from the config
    #[arg(long)]
    max_pages: Option<usize>,

    /// Write run statistics as JSON
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Hide progress bars, log progress lines instead
    #[arg(long)]
    log_only: bool,
}

fn read_page(path: &Path) -> Result<FeedPage> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let page: FeedPage = serde_json::from_str(&content)
        .with_context(|| format!("Invalid response format in {:?}", path))?;
    Ok(page)
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    set_log_only(args.log_only);

    let config = CatalogConfig::load_or_default(args.config.as_deref())
        .context("Failed to load config")?;
    let max_pages = args.max_pages.unwrap_or(config.feed.max_pages);

    let start = Instant::now();
    let mut catalog = SqliteCatalog::open(&args.db).context("Failed to open catalog database")?;
    let mut run = IngestionRun::new(config.variant_rules(), config.ingest.clone());
    let mut stats = IngestStats::default();

    let page_count = args.pages.len().min(max_pages);
    let pb = create_progress_bar(page_count as u64, "Importing pages");

    for (n, path) in args.pages.iter().take(max_pages).enumerate() {
        info!("Reading page {} from {:?}", n + 1, path);
        let page = match read_page(path) {
            Ok(page) => page,
            Err(e) => {
                warn!("Error reading page {}: {:#}", n + 1, e);
                break;
            }
        };
        stats.pages_read += 1;

        let importable: Vec<&FeedEntry> = page
            .data
            .iter()
            .filter(|entry| {
                stats.entries_seen += 1;
                if !config.feed.allows_type(entry.media_type.as_deref()) {
                    stats.skipped_media_type += 1;
                    info!("Skipping {} - Not a TV series", entry.title);
                    return false;
                }
                if config.feed.excludes_rating(entry.rating.as_deref()) {
                    stats.skipped_rating += 1;
                    return false;
                }
                true
            })
            .collect();
        let page_titles: Vec<String> = importable.iter().map(|e| e.title.clone()).collect();

        for entry in importable {
            match run.evaluate(&entry.title, &page_titles) {
                IngestDecision::Accept { key } => match catalog.upsert_anime(entry, &key) {
                    Ok(_) => {
                        info!("Added/Updated: {}", key);
                        run.mark_processed(key);
                        stats.accepted += 1;
                    }
                    Err(e) => {
                        warn!("Error processing {}: {}", key, e);
                        stats.upsert_failures += 1;
                    }
                },
                IngestDecision::Reject(reason) => {
                    info!("Skipping {} - {}", entry.title, reason.label());
                    stats.record_rejection(&reason);
                }
            }
        }

        pb.inc(1);
        log_progress("Importing pages", n as u64 + 1, page_count as u64, 1);
        if !page.pagination.has_next_page {
            break;
        }
    }
    pb.finish_with_message(format!("Imported {} pages", stats.pages_read));

    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    info!(
        "Finished processing {} unique anime titles in {}",
        run.processed_titles().len(),
        format_duration(start.elapsed())
    );

    if args.log_only {
        stats.log_phase("import-anime");
    }
    if let Some(path) = args.stats {
        stats
            .write_to_file(&path)
            .with_context(|| format!("Failed to write stats to {:?}", path))?;
    }

    Ok(())
}

use anime_catalog::config::CatalogConfig;
use anime_catalog::dedup::Deduplicator;
use anime_catalog::progress::{format_duration, set_log_only};
use anime_catalog::store::SqliteCatalog;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "clean-duplicates")]
#[command(about = "Collapse duplicate and sequel anime entries into one canonical record")]
struct Args {
    /// Catalog SQLite database
    db: PathBuf,

    /// TOML file with extra variant patterns
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log the plan without rebinding or deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Write run statistics as JSON
    #[arg(long)]
    stats: Option<PathBuf>,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Hide progress bars, log progress lines instead
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let config = CatalogConfig::load_or_default(args.config.as_deref())
        .context("Failed to load config")?;
    let rules = config.variant_rules();

    let start = Instant::now();
    info!(
        "Starting similar titles cleanup {}on {:?}",
        if args.dry_run { "(dry-run) " } else { "" },
        args.db
    );
    let mut catalog = SqliteCatalog::open(&args.db).context("Failed to open catalog database")?;

    let mut stats = Deduplicator::new(&rules)
        .dry_run(args.dry_run)
        .run(&mut catalog)
        .context("Deduplication failed")?;
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    println!("\n{:=<60}", "");
    println!("Cleanup complete!");
    println!("  Records scanned:    {}", stats.records_loaded);
    println!("  Exact duplicates:   {} removed", stats.exact_deleted);
    println!("  Variants:           {} removed", stats.variant_deleted);
    println!("  Scenes rebound:     {}", stats.scenes_rebound);
    println!("  Storage conflicts:  {}", stats.storage_conflicts);
    println!("  Ambiguous clusters: {}", stats.ambiguous_clusters);
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    if args.log_only {
        stats.log_phase("clean-duplicates");
    }
    if let Some(path) = args.stats {
        stats
            .write_to_file(&path)
            .with_context(|| format!("Failed to write stats to {:?}", path))?;
    }

    Ok(())
}

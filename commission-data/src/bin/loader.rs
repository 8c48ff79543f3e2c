use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use commission_data::{RuleLoader, SalesLineLoader, SalesmanLoader};
use commission_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load commission rules, salesmen and sales lines from CSV files into the
/// database.
///
/// Files are loaded in dependency order: rules, then salesmen, then sales.
/// Rules are upserted by brand, salesmen by id, and each salesman's sales
/// lines are replaced wholesale, so re-running with the same files is safe.
#[derive(Parser, Debug)]
#[command(name = "commission-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV with columns brand,fixed_commission,price_threshold,class_a_percent,class_b_percent,class_c_percent
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// CSV with columns id,name,code,previous_year_sales
    #[arg(short = 'p', long)]
    salesmen: Option<PathBuf>,

    /// CSV with columns salesman_id,brand,car_class,units_sold,price
    #[arg(short = 'l', long)]
    sales: Option<PathBuf>,

    /// SQLite database path or URL (created if missing)
    #[arg(short, long, default_value = "commissions.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open: {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let has_work = args.rules.is_some()
        || args.salesmen.is_some()
        || args.sales.is_some()
        || args.migrate
        || args.seeds.is_some();
    if !has_work {
        anyhow::bail!("nothing to do: pass --rules, --salesmen, --sales, --migrate or --seeds");
    }

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    if let Some(path) = &args.rules {
        let records = RuleLoader::parse(open(path)?)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let loaded = RuleLoader::load(&repo, &records)
            .await
            .context("Failed to load commission rules into database")?;
        println!("Loaded {} commission rules from {}.", loaded, path.display());
    }

    if let Some(path) = &args.salesmen {
        let records = SalesmanLoader::parse(open(path)?)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let loaded = SalesmanLoader::load(&repo, &records)
            .await
            .context("Failed to load salesmen into database")?;
        println!("Loaded {} salesmen from {}.", loaded, path.display());
    }

    if let Some(path) = &args.sales {
        let records = SalesLineLoader::parse(open(path)?)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let loaded = SalesLineLoader::load(&repo, &records)
            .await
            .context("Failed to load sales lines into database")?;
        println!("Loaded {} sales lines from {}.", loaded, path.display());
    }

    Ok(())
}

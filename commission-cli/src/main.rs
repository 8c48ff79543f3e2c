use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{debug, info};

use commission_cli::app::{self, OutputFormat};
use commission_cli::config::{AppConfig, ConfigOverrides};
use commission_cli::logging;
use commission_core::{SortBy, SortOrder};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Dealership commission report.
///
/// Connects to the configured database, computes every salesman's commission
/// from the rule catalog and the sales ledger, and prints the report.
#[derive(Debug, Parser)]
#[command(name = "commission-report", version, about, long_about = None)]
struct Cli {
    /// TOML configuration file. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `commissions.db`) or `:memory:`.
    #[arg(long)]
    db: Option<String>,

    /// Restrict the report to one salesman id.
    #[arg(long)]
    salesman: Option<i64>,

    /// Sort key: `total_commission` or `salesman`.
    #[arg(long)]
    sort_by: Option<SortBy>,

    /// Sort direction: `asc` or `desc`.
    #[arg(long)]
    sort_order: Option<SortOrder>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Also write the report as CSV to `--out-dir`.
    #[arg(long, default_value_t = false)]
    export: bool,

    /// Directory for `--export`.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Log level or `EnvFilter` directive (`RUST_LOG` wins when set).
    #[arg(long)]
    log_level: Option<String>,

    /// Append log output to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend: self.backend.clone(),
            connection_string: self.db.clone(),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli.overrides());
    logging::init_logging(&config.logging)?;
    let policy = config.policy()?;

    debug!(
        backend = %config.database.backend,
        connection = %config.database.connection_string,
        "connecting to database"
    );
    let registry = app::build_registry()?;
    let repo = registry
        .create(&config.database)
        .await
        .with_context(|| format!("failed to open {} backend", config.database.backend))?;

    let catalog = app::load_catalog(&*repo, policy).await?;
    let filters = config.filters(cli.salesman);
    let report = app::load_report(&*repo, &catalog, &filters).await?;

    match cli.format {
        OutputFormat::Table => {
            println!("{}", app::render_rules(&catalog));
            print!("{}", app::render_report(&report));
        }
        OutputFormat::Json => println!("{}", app::render_json(&report)?),
    }

    if cli.export {
        let path = app::export_report(&report, &cli.out_dir, Local::now().date_naive())?;
        info!(path = %path.display(), "report exported");
    }

    Ok(())
}

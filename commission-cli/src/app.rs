use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use commission_core::calculations::common::format_currency;
use commission_core::calculations::{CommissionPolicy, write_csv};
use commission_core::db::RepositoryRegistry;
use commission_core::payload::ReportPayload;
use commission_core::{
    CarClass, CommissionRepository, Report, ReportFilters, RuleCatalog, build_report,
};
use commission_db_sqlite::SqliteRepositoryFactory;
use rust_decimal::Decimal;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Rule catalog followed by the per-salesman report.
    #[default]
    Table,
    /// The dashboard payload as pretty-printed JSON.
    Json,
}

/// Build a [`RepositoryRegistry`] with every ledger backend compiled into
/// this binary. Today that is SQLite only.
pub fn build_registry() -> Result<RepositoryRegistry> {
    let mut registry = RepositoryRegistry::new();
    registry
        .register(Box::new(SqliteRepositoryFactory))
        .context("failed to register sqlite backend")?;
    Ok(registry)
}

/// Fetch the rule catalog and pair it with the configured policy.
pub async fn load_catalog(
    repo: &dyn CommissionRepository,
    policy: CommissionPolicy,
) -> Result<RuleCatalog> {
    let rules = repo
        .list_commission_rules()
        .await
        .context("failed to load commission rules")?;
    debug!(rules = rules.len(), "loaded commission rules");
    RuleCatalog::with_policy(rules, policy).context("invalid commission rule catalog")
}

/// Fetch the roster and the ledger, then build the report.
///
/// Only the filtered salesman's sales lines are fetched when a filter is set.
pub async fn load_report(
    repo: &dyn CommissionRepository,
    catalog: &RuleCatalog,
    filters: &ReportFilters,
) -> Result<Report> {
    let salesmen = repo
        .list_salesmen()
        .await
        .context("failed to load salesmen")?;
    let lines = repo
        .list_sales_lines(filters.salesman_id)
        .await
        .context("failed to load sales lines")?;
    debug!(salesmen = salesmen.len(), lines = lines.len(), "loaded sales ledger");

    build_report(catalog, &salesmen, &lines, filters).context("failed to build commission report")
}

fn percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}

/// The "Commission Rules" reference table.
pub fn render_rules(catalog: &RuleCatalog) -> String {
    let mut out = String::new();
    let policy = catalog.policy();

    let _ = writeln!(out, "Commission Rules");
    let _ = writeln!(
        out,
        "{:<16} {:>12} {:>14} {:>8} {:>8} {:>8}",
        "Brand", "Fixed", "Threshold", "A-Class", "B-Class", "C-Class"
    );
    for rule in catalog.rules() {
        let class = |car_class: CarClass| {
            rule.percent_for(car_class)
                .map(percent)
                .unwrap_or_else(|| "-".to_string())
        };
        let _ = writeln!(
            out,
            "{:<16} {:>12} {:>14} {:>8} {:>8} {:>8}",
            rule.brand,
            format_currency(rule.fixed_commission),
            format_currency(rule.price_threshold),
            class(CarClass::A),
            class(CarClass::B),
            class(CarClass::C),
        );
    }
    let _ = writeln!(
        out,
        "Bonus: +{} on {} when previous year sales exceed {} (threshold policy: {})",
        percent(policy.bonus_percent),
        policy.bonus_class.label(),
        format_currency(policy.bonus_threshold),
        policy.threshold_policy.as_str(),
    );
    out
}

/// Human-readable report: one block per salesman in report order, then the
/// summary.
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    if report.is_empty() {
        let _ = writeln!(out, "No salesmen match the requested filters.");
    }

    for entry in report.entries() {
        let salesman = &entry.salesman;
        let _ = writeln!(
            out,
            "{} ({})  previous year {}  bonus {}  total {}",
            salesman.name,
            salesman.code,
            format_currency(salesman.previous_year_sales),
            if entry.qualifies_for_bonus { "yes" } else { "no" },
            format_currency(entry.total_commission),
        );
        if entry.lines.is_empty() {
            let _ = writeln!(out, "  (no sales)");
        }
        for line in &entry.lines {
            let _ = writeln!(
                out,
                "  {:<16} {:<8} {:>4} x  {:>5} + {:<5} fixed {:>12}  percent {:>12}  total {:>12}",
                line.brand,
                line.car_class.label(),
                line.units_sold,
                percent(line.base_percent),
                percent(line.bonus_percent),
                format_currency(line.fixed_commission),
                format_currency(line.percent_commission),
                format_currency(line.total_commission),
            );
        }
    }

    let summary = report.summary();
    let _ = writeln!(
        out,
        "Salesmen: {}  Grand total: {}",
        summary.total_salesmen,
        format_currency(summary.grand_total_commission),
    );
    out
}

pub fn render_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(&ReportPayload::from(report))
        .context("failed to serialise report payload")
}

/// `commission_report_<YYYY-MM-DD>.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("commission_report_{}.csv", date.format("%Y-%m-%d"))
}

/// Write the report as CSV into `out_dir`, creating the directory if needed.
/// Returns the path written.
pub fn export_report(
    report: &Report,
    out_dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create export directory '{}'", out_dir.display()))?;

    let path = out_dir.join(export_file_name(date));
    let file = File::create(&path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    let rows = write_csv(report, BufWriter::new(file))
        .with_context(|| format!("failed to write '{}'", path.display()))?;

    info!(path = %path.display(), rows, "exported commission report");
    Ok(path)
}

//! End-to-end: configuration file, registry-built SQLite repository, report,
//! rendering and CSV export.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use commission_cli::app;
use commission_cli::config::AppConfig;
use commission_core::calculations::ThresholdPolicy;
use commission_core::{CarClass, CommissionRepository, SalesLine, Salesman};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn fixture_config() -> AppConfig {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/commission.toml");
    AppConfig::load(Some(&path)).expect("fixture config should parse")
}

async fn populated_repository(config: &AppConfig) -> Box<dyn CommissionRepository> {
    let repo = app::build_registry()
        .unwrap()
        .create(&config.database)
        .await
        .expect("sqlite backend should open");

    repo.upsert_salesman(&Salesman::new(1, "Carol", "S-001", dec!(450000)))
        .await
        .unwrap();
    repo.upsert_salesman(&Salesman::new(2, "Alice", "S-002", dec!(150000)))
        .await
        .unwrap();
    for line in [
        SalesLine::new(1, "Audi", CarClass::A, 1, dec!(20000)),
        SalesLine::new(1, "BMW", CarClass::B, 1, dec!(50000)),
        SalesLine::new(2, "Toyota", CarClass::C, 2, dec!(18000)),
    ] {
        repo.insert_sales_line(&line).await.unwrap();
    }
    repo
}

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("commission-cli-{}-{}", name, std::process::id()))
}

#[test]
fn fixture_config_sets_policy_and_ordering() {
    let config = fixture_config();

    let policy = config.policy().unwrap();

    assert_eq!(policy.bonus_threshold, dec!(400000));
    assert_eq!(policy.bonus_percent, dec!(2.5));
    assert_eq!(policy.threshold_policy, ThresholdPolicy::GateFixedFee);
    assert_eq!(config.logging.level, "debug");
}

#[tokio::test]
async fn configured_policy_drives_the_report() {
    let config = fixture_config();
    let repo = populated_repository(&config).await;

    let catalog = app::load_catalog(&*repo, config.policy().unwrap()).await.unwrap();
    let report = app::load_report(&*repo, &catalog, &config.filters(None))
        .await
        .unwrap();

    let totals: Vec<_> = report
        .entries()
        .iter()
        .map(|e| (e.salesman.name.as_str(), e.qualifies_for_bonus, e.total_commission))
        .collect();
    assert_eq!(
        totals,
        vec![("Alice", false, dec!(540.00)), ("Carol", true, dec!(4250.00))]
    );

    let carol_audi = &report.entries()[1].lines[0];
    assert_eq!(carol_audi.fixed_commission, dec!(0));
    assert_eq!(carol_audi.bonus_percent, dec!(2.5));
    assert_eq!(report.summary().grand_total_commission, dec!(4790.00));
}

#[tokio::test]
async fn salesman_filter_fetches_one_ledger() {
    let config = fixture_config();
    let repo = populated_repository(&config).await;

    let catalog = app::load_catalog(&*repo, config.policy().unwrap()).await.unwrap();
    let report = app::load_report(&*repo, &catalog, &config.filters(Some(2)))
        .await
        .unwrap();

    assert_eq!(report.summary().total_salesmen, 1);
    assert_eq!(report.entries()[0].salesman.code, "S-002");
    assert!(app::render_report(&report).contains("Grand total: $540.00"));
}

#[tokio::test]
async fn export_writes_dated_csv() {
    let config = fixture_config();
    let repo = populated_repository(&config).await;
    let catalog = app::load_catalog(&*repo, config.policy().unwrap()).await.unwrap();
    let report = app::load_report(&*repo, &catalog, &config.filters(None))
        .await
        .unwrap();
    let out_dir = scratch_dir("export");
    let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

    let path = app::export_report(&report, &out_dir, date).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_dir_all(&out_dir).ok();

    assert_eq!(path.file_name().unwrap(), "commission_report_2026-10-19.csv");
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("salesman_id,salesman_name"));
    assert!(lines[1].starts_with("2,Alice,S-002,150000,false,Toyota,C,2,"));
}

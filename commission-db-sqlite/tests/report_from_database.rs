use commission_core::db::{DbConfig, RepositoryRegistry};
use commission_core::{
    CarClass, CommissionRepository, ReportFilters, RuleCatalog, SalesLine, Salesman, build_report,
};
use commission_db_sqlite::SqliteRepositoryFactory;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

async fn seeded_repository() -> Box<dyn CommissionRepository> {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory)).unwrap();
    let repo = registry
        .create(&DbConfig::default())
        .await
        .expect("sqlite backend should be registered");

    for salesman in [
        Salesman::new(1, "Carol", "S-001", dec!(600000)),
        Salesman::new(2, "Alice", "S-002", dec!(150000)),
        Salesman::new(3, "Bob", "S-003", dec!(90000)),
    ] {
        repo.upsert_salesman(&salesman).await.unwrap();
    }
    for line in [
        SalesLine::new(1, "Audi", CarClass::A, 2, dec!(80000)),
        SalesLine::new(1, "BMW", CarClass::B, 1, dec!(50000)),
        SalesLine::new(2, "Audi", CarClass::C, 1, dec!(20000)),
    ] {
        repo.insert_sales_line(&line).await.unwrap();
    }
    repo
}

#[tokio::test]
async fn report_built_from_seeded_database() {
    let repo = seeded_repository().await;

    let catalog = RuleCatalog::new(repo.list_commission_rules().await.unwrap()).unwrap();
    let salesmen = repo.list_salesmen().await.unwrap();
    let lines = repo.list_sales_lines(None).await.unwrap();
    let report = build_report(&catalog, &salesmen, &lines, &ReportFilters::default()).unwrap();

    let totals: Vec<_> = report
        .entries()
        .iter()
        .map(|e| (e.salesman.name.as_str(), e.total_commission))
        .collect();

    assert_eq!(
        totals,
        vec![("Carol", dec!(14950.00)), ("Alice", dec!(900.00)), ("Bob", dec!(0.00))]
    );
    assert_eq!(report.summary().grand_total_commission, dec!(15850.00));
}

#[tokio::test]
async fn filtered_ledger_matches_filtered_report() {
    let repo = seeded_repository().await;

    let catalog = RuleCatalog::new(repo.list_commission_rules().await.unwrap()).unwrap();
    let salesmen = repo.list_salesmen().await.unwrap();
    let lines = repo.list_sales_lines(Some(2)).await.unwrap();
    let filters = ReportFilters {
        salesman_id: Some(2),
        ..ReportFilters::default()
    };
    let report = build_report(&catalog, &salesmen, &lines, &filters).unwrap();

    assert_eq!(report.entries().len(), 1);
    assert_eq!(report.entries()[0].lines.len(), 1);
    assert_eq!(report.summary().grand_total_commission, dec!(900.00));
}

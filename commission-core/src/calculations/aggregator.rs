//! Report aggregation across all salesmen.
//!
//! [`build_report`] validates the ledger against the rule catalog, computes
//! every salesman's entry on a rayon pool, waits for all of them, then sorts
//! and summarises. Sorting and the summary only ever see final, rounded
//! per-salesman totals.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::calculations::{CommissionCalculator, CommissionError};
use crate::models::{
    Report, ReportFilters, RuleCatalog, SalesLine, Salesman, SalesmanReportEntry, SortBy,
    SortOrder,
};

/// Builds a commission report for the given ledger snapshot.
///
/// Every known salesman gets exactly one entry, including those with no
/// sales lines. When `filters.salesman_id` is set, only that salesman is
/// considered and the summary covers only that salesman; an id that matches
/// nobody yields an empty report rather than an error.
///
/// # Errors
///
/// * [`CommissionError::DuplicateSalesman`] if a salesman id repeats.
/// * [`CommissionError::UnknownBrand`] naming the first line, in input
///   order, whose brand has no rule.
/// * [`CommissionError::UnknownSalesman`] if a line belongs to nobody in
///   `salesmen`.
/// * [`CommissionError::UnknownClass`] from the calculator.
/// * [`CommissionError::Overflow`] if a line, salesman or grand total
///   exceeds the `Decimal` range.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use commission_core::calculations::build_report;
/// use commission_core::{
///     CarClass, CommissionRule, ReportFilters, RuleCatalog, SalesLine, Salesman,
/// };
///
/// let catalog = RuleCatalog::new(vec![
///     CommissionRule::new("Audi", dec!(500), dec!(25000), dec!(5), dec!(3), dec!(2)),
/// ])
/// .unwrap();
/// let salesmen = vec![
///     Salesman::new(1, "Alice", "S-001", dec!(600000)),
///     Salesman::new(2, "Bob", "S-002", dec!(120000)),
/// ];
/// let lines = vec![SalesLine::new(1, "Audi", CarClass::A, 2, dec!(80000))];
///
/// let report = build_report(&catalog, &salesmen, &lines, &ReportFilters::default()).unwrap();
///
/// assert_eq!(report.summary().total_salesmen, 2);
/// assert_eq!(report.summary().grand_total_commission, dec!(12200));
/// assert_eq!(report.entries()[1].total_commission, dec!(0));
/// ```
pub fn build_report(
    catalog: &RuleCatalog,
    salesmen: &[Salesman],
    sales_lines: &[SalesLine],
    filters: &ReportFilters,
) -> Result<Report, CommissionError> {
    let (salesmen, sales_lines): (Vec<&Salesman>, Vec<&SalesLine>) = match filters.salesman_id {
        Some(id) => {
            let selected: Vec<&Salesman> = salesmen.iter().filter(|s| s.id == id).collect();
            if selected.is_empty() {
                warn!(salesman_id = id, "no salesman matches filter; returning empty report");
                return Ok(Report::empty(filters.clone()));
            }
            let lines = sales_lines.iter().filter(|l| l.salesman_id == id).collect();
            (selected, lines)
        }
        None => (salesmen.iter().collect(), sales_lines.iter().collect()),
    };

    let known_ids = unique_salesman_ids(&salesmen)?;
    validate_lines(catalog, &known_ids, &sales_lines)?;

    let mut lines_by_salesman: HashMap<i64, Vec<&SalesLine>> = HashMap::new();
    for line in sales_lines {
        lines_by_salesman.entry(line.salesman_id).or_default().push(line);
    }

    let calculator = CommissionCalculator::new(catalog.policy().clone());

    // Computed independently per salesman; the collect is the join point.
    let computed: Vec<Result<SalesmanReportEntry, CommissionError>> = salesmen
        .par_iter()
        .map(|salesman| {
            let lines = lines_by_salesman
                .get(&salesman.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            build_entry(catalog, &calculator, salesman, lines)
        })
        .collect();
    let mut entries = computed.into_iter().collect::<Result<Vec<_>, _>>()?;

    sort_entries(&mut entries, filters.sort_by, filters.sort_order);

    let report = Report::from_sorted_entries(entries, filters.clone())?;
    info!(
        salesmen = report.summary().total_salesmen,
        grand_total = %report.summary().grand_total_commission,
        sort_by = %filters.sort_by,
        sort_order = %filters.sort_order,
        "built commission report"
    );
    Ok(report)
}

fn unique_salesman_ids(salesmen: &[&Salesman]) -> Result<HashSet<i64>, CommissionError> {
    let mut ids = HashSet::with_capacity(salesmen.len());
    for salesman in salesmen {
        if !ids.insert(salesman.id) {
            return Err(CommissionError::DuplicateSalesman(salesman.id));
        }
    }
    Ok(ids)
}

/// Rejects the first line, in input order, with an unpriced brand or an
/// owner outside the ledger.
fn validate_lines(
    catalog: &RuleCatalog,
    known_ids: &HashSet<i64>,
    sales_lines: &[&SalesLine],
) -> Result<(), CommissionError> {
    for line in sales_lines {
        if catalog.get(&line.brand).is_none() {
            return Err(CommissionError::UnknownBrand(line.brand.clone()));
        }
        if !known_ids.contains(&line.salesman_id) {
            return Err(CommissionError::UnknownSalesman(line.salesman_id));
        }
    }
    Ok(())
}

fn build_entry(
    catalog: &RuleCatalog,
    calculator: &CommissionCalculator,
    salesman: &Salesman,
    lines: &[&SalesLine],
) -> Result<SalesmanReportEntry, CommissionError> {
    let qualifies_for_bonus = calculator
        .policy()
        .qualifies_for_bonus(salesman.previous_year_sales);

    let lines = lines
        .iter()
        .map(|line| {
            let rule = catalog
                .get(&line.brand)
                .ok_or_else(|| CommissionError::UnknownBrand(line.brand.clone()))?;
            calculator.compute(rule, line, qualifies_for_bonus)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total_commission = lines
        .iter()
        .try_fold(Decimal::new(0, 2), |acc, line| acc.checked_add(line.total_commission))
        .ok_or_else(|| CommissionError::Overflow(format!("salesman {} total", salesman.id)))?;

    Ok(SalesmanReportEntry {
        salesman: salesman.clone(),
        qualifies_for_bonus,
        lines,
        total_commission,
    })
}

/// Orders entries by the requested key. `order` reverses the primary key
/// only; ties always fall back to name then id, ascending.
///
/// Names compare case-insensitively first, so "alice" sorts before "Bob";
/// names differing only in case keep byte order.
pub fn sort_entries(
    entries: &mut [SalesmanReportEntry],
    sort_by: SortBy,
    order: SortOrder,
) {
    entries.sort_by(|a, b| {
        let primary = match sort_by {
            SortBy::TotalCommission => a.total_commission.cmp(&b.total_commission),
            SortBy::Salesman => compare_names(&a.salesman.name, &b.salesman.name),
        };
        let primary = match order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| tie_break(a, b))
    });
}

fn tie_break(
    a: &SalesmanReportEntry,
    b: &SalesmanReportEntry,
) -> Ordering {
    compare_names(&a.salesman.name, &b.salesman.name)
        .then_with(|| a.salesman.id.cmp(&b.salesman.id))
}

fn compare_names(
    a: &str,
    b: &str,
) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::CommissionPolicy;
    use crate::models::{CarClass, CommissionRule};

    fn catalog() -> RuleCatalog {
        RuleCatalog::new(vec![
            CommissionRule::new("Audi", dec!(500), dec!(25000), dec!(5), dec!(3), dec!(2)),
            CommissionRule::new("BMW", dec!(750), dec!(30000), dec!(6), dec!(4), dec!(2.5)),
        ])
        .unwrap()
    }

    fn salesmen() -> Vec<Salesman> {
        vec![
            Salesman::new(1, "Carol", "S-001", dec!(600000)),
            Salesman::new(2, "Alice", "S-002", dec!(500000)),
            Salesman::new(3, "Bob", "S-003", dec!(100000)),
            Salesman::new(4, "Dave", "S-004", dec!(0)),
        ]
    }

    fn lines() -> Vec<SalesLine> {
        vec![
            SalesLine::new(1, "Audi", CarClass::A, 2, dec!(80000)),
            SalesLine::new(1, "BMW", CarClass::B, 1, dec!(50000)),
            SalesLine::new(2, "Audi", CarClass::A, 1, dec!(40000)),
            SalesLine::new(3, "BMW", CarClass::C, 2, dec!(33333.33)),
        ]
    }

    fn names(report: &Report) -> Vec<&str> {
        report
            .entries()
            .iter()
            .map(|e| e.salesman.name.as_str())
            .collect()
    }

    #[test]
    fn every_salesman_appears_once_including_idle_ones() {
        let report = build_report(&catalog(), &salesmen(), &lines(), &ReportFilters::default()).unwrap();

        assert_eq!(report.summary().total_salesmen, 4);
        let dave = report
            .entries()
            .iter()
            .find(|e| e.salesman.id == 4)
            .unwrap();
        assert!(dave.lines.is_empty());
        assert_eq!(dave.total_commission.to_string(), "0.00");
    }

    #[test]
    fn entry_totals_and_grand_total() {
        let report = build_report(&catalog(), &salesmen(), &lines(), &ReportFilters::default()).unwrap();
        let totals: Vec<_> = report
            .entries()
            .iter()
            .map(|e| (e.salesman.id, e.total_commission))
            .collect();

        // Carol: 12200 + (750 + 4% of 50000) = 12200 + 2750
        // Alice: 500 + 5% of 40000 (exactly 500000, no bonus)
        // Bob:   2 × 750 + 2.5% × 33333.33 × 2 = 1500 + 1666.6665 -> 3166.67
        assert_eq!(
            totals,
            vec![
                (1, dec!(14950.00)),
                (3, dec!(3166.67)),
                (2, dec!(2500.00)),
                (4, dec!(0.00)),
            ]
        );
        assert_eq!(report.summary().grand_total_commission, dec!(20616.67));
    }

    #[test]
    fn grand_total_equals_sum_of_entry_totals() {
        let report = build_report(&catalog(), &salesmen(), &lines(), &ReportFilters::default()).unwrap();

        let summed: Decimal = report.entries().iter().map(|e| e.total_commission).sum();

        assert_eq!(report.summary().grand_total_commission, summed);
    }

    #[test]
    fn bonus_boundary_is_exclusive() {
        let report = build_report(&catalog(), &salesmen(), &lines(), &ReportFilters::default()).unwrap();
        let by_id = |id: i64| report.entries().iter().find(|e| e.salesman.id == id).unwrap();

        assert!(by_id(1).qualifies_for_bonus);
        assert_eq!(by_id(1).lines[0].bonus_percent, dec!(2));
        assert_eq!(by_id(1).lines[1].bonus_percent, dec!(0));
        assert!(!by_id(2).qualifies_for_bonus);
        assert_eq!(by_id(2).lines[0].bonus_percent, dec!(0));
    }

    #[test]
    fn bonus_at_500001_applies() {
        let salesmen = vec![Salesman::new(7, "Erin", "S-007", dec!(500001))];
        let lines = vec![SalesLine::new(7, "Audi", CarClass::A, 1, dec!(10000))];

        let report = build_report(&catalog(), &salesmen, &lines, &ReportFilters::default()).unwrap();

        assert_eq!(report.entries()[0].lines[0].bonus_percent, dec!(2));
    }

    #[test]
    fn lines_keep_input_order_within_salesman() {
        let report = build_report(&catalog(), &salesmen(), &lines(), &ReportFilters::default()).unwrap();
        let carol = &report.entries()[0];

        let brands: Vec<_> = carol.lines.iter().map(|l| l.brand.as_str()).collect();
        assert_eq!(brands, vec!["Audi", "BMW"]);
    }

    #[test]
    fn sort_by_total_desc_is_non_increasing() {
        let report = build_report(&catalog(), &salesmen(), &lines(), &ReportFilters::default()).unwrap();

        assert!(report
            .entries()
            .windows(2)
            .all(|w| w[0].total_commission >= w[1].total_commission));
    }

    #[test]
    fn sort_by_total_asc() {
        let filters = ReportFilters {
            sort_order: SortOrder::Asc,
            ..ReportFilters::default()
        };

        let report = build_report(&catalog(), &salesmen(), &lines(), &filters).unwrap();

        assert_eq!(names(&report), vec!["Dave", "Alice", "Bob", "Carol"]);
    }

    #[test]
    fn sort_by_salesman_name_both_directions() {
        let asc = ReportFilters {
            sort_by: SortBy::Salesman,
            sort_order: SortOrder::Asc,
            salesman_id: None,
        };
        let desc = ReportFilters {
            sort_order: SortOrder::Desc,
            ..asc.clone()
        };

        let asc = build_report(&catalog(), &salesmen(), &lines(), &asc).unwrap();
        let desc = build_report(&catalog(), &salesmen(), &lines(), &desc).unwrap();

        assert_eq!(names(&asc), vec!["Alice", "Bob", "Carol", "Dave"]);
        assert_eq!(names(&desc), vec!["Dave", "Carol", "Bob", "Alice"]);
    }

    #[test]
    fn name_sort_ignores_case() {
        let salesmen = vec![
            Salesman::new(1, "Bob", "S-1", dec!(0)),
            Salesman::new(2, "alice", "S-2", dec!(0)),
            Salesman::new(3, "Alice", "S-3", dec!(0)),
        ];
        let filters = ReportFilters {
            sort_by: SortBy::Salesman,
            sort_order: SortOrder::Asc,
            salesman_id: None,
        };

        let report = build_report(&catalog(), &salesmen, &[], &filters).unwrap();

        assert_eq!(names(&report), vec!["Alice", "alice", "Bob"]);
    }

    #[test]
    fn equal_totals_break_ties_by_name_ascending_in_either_order() {
        let salesmen = vec![
            Salesman::new(1, "Zed", "S-1", dec!(0)),
            Salesman::new(2, "Amy", "S-2", dec!(0)),
            Salesman::new(3, "Max", "S-3", dec!(0)),
        ];
        let lines = vec![
            SalesLine::new(1, "Audi", CarClass::B, 1, dec!(10000)),
            SalesLine::new(2, "Audi", CarClass::B, 1, dec!(10000)),
        ];

        for sort_order in [SortOrder::Asc, SortOrder::Desc] {
            let filters = ReportFilters {
                sort_order,
                ..ReportFilters::default()
            };
            let report = build_report(&catalog(), &salesmen, &lines, &filters).unwrap();
            let tied: Vec<_> = names(&report)
                .into_iter()
                .filter(|n| *n != "Max")
                .collect();

            assert_eq!(tied, vec!["Amy", "Zed"], "order {sort_order}");
        }
    }

    #[test]
    fn unknown_brand_fails_naming_brand() {
        let catalog = RuleCatalog::new(vec![CommissionRule::new(
            "Audi",
            dec!(500),
            dec!(25000),
            dec!(5),
            dec!(3),
            dec!(2),
        )])
        .unwrap();
        let salesmen = vec![Salesman::new(1, "Carol", "S-001", dec!(0))];
        let lines = vec![
            SalesLine::new(1, "Audi", CarClass::A, 1, dec!(30000)),
            SalesLine::new(1, "Renault", CarClass::B, 1, dec!(15000)),
        ];

        let result = build_report(&catalog, &salesmen, &lines, &ReportFilters::default());

        assert_eq!(result, Err(CommissionError::UnknownBrand("Renault".to_string())));
    }

    #[test]
    fn orphan_line_is_rejected() {
        let lines = vec![SalesLine::new(99, "Audi", CarClass::A, 1, dec!(30000))];

        let result = build_report(&catalog(), &salesmen(), &lines, &ReportFilters::default());

        assert_eq!(result, Err(CommissionError::UnknownSalesman(99)));
    }

    #[test]
    fn duplicate_salesman_is_rejected() {
        let mut salesmen = salesmen();
        salesmen.push(Salesman::new(2, "Alice Again", "S-002", dec!(0)));

        let result = build_report(&catalog(), &salesmen, &lines(), &ReportFilters::default());

        assert_eq!(result, Err(CommissionError::DuplicateSalesman(2)));
    }

    fn huge_fee_catalog() -> RuleCatalog {
        RuleCatalog::new(vec![CommissionRule::new(
            "Bugatti",
            Decimal::MAX,
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(0),
        )])
        .unwrap()
    }

    #[test]
    fn salesman_total_overflow_is_an_error() {
        let salesmen = vec![Salesman::new(1, "Carol", "S-001", dec!(0))];
        let lines = vec![
            SalesLine::new(1, "Bugatti", CarClass::C, 1, dec!(1)),
            SalesLine::new(1, "Bugatti", CarClass::C, 1, dec!(1)),
        ];

        let result = build_report(&huge_fee_catalog(), &salesmen, &lines, &ReportFilters::default());

        assert_eq!(result, Err(CommissionError::Overflow("salesman 1 total".to_string())));
    }

    #[test]
    fn grand_total_overflow_is_an_error() {
        let salesmen = vec![
            Salesman::new(1, "Carol", "S-001", dec!(0)),
            Salesman::new(2, "Alice", "S-002", dec!(0)),
        ];
        let lines = vec![
            SalesLine::new(1, "Bugatti", CarClass::C, 1, dec!(1)),
            SalesLine::new(2, "Bugatti", CarClass::C, 1, dec!(1)),
        ];

        let result = build_report(&huge_fee_catalog(), &salesmen, &lines, &ReportFilters::default());

        assert_eq!(result, Err(CommissionError::Overflow("report grand total".to_string())));
    }

    #[test]
    fn filter_restricts_entries_and_summary() {
        let filters = ReportFilters {
            salesman_id: Some(2),
            ..ReportFilters::default()
        };

        let report = build_report(&catalog(), &salesmen(), &lines(), &filters).unwrap();

        assert_eq!(names(&report), vec!["Alice"]);
        assert_eq!(report.summary().total_salesmen, 1);
        assert_eq!(report.summary().grand_total_commission, dec!(2500));
        assert_eq!(report.filters(), &filters);
    }

    #[test]
    fn filter_ignores_bad_lines_of_other_salesmen() {
        let mut lines = lines();
        lines.push(SalesLine::new(3, "Renault", CarClass::A, 1, dec!(1)));
        let filters = ReportFilters {
            salesman_id: Some(1),
            ..ReportFilters::default()
        };

        let report = build_report(&catalog(), &salesmen(), &lines, &filters).unwrap();

        assert_eq!(report.summary().grand_total_commission, dec!(14950));
    }

    #[test]
    fn unmatched_filter_yields_empty_report() {
        let filters = ReportFilters {
            salesman_id: Some(404),
            ..ReportFilters::default()
        };

        let report = build_report(&catalog(), &salesmen(), &lines(), &filters).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.summary().total_salesmen, 0);
        assert_eq!(report.summary().grand_total_commission, dec!(0));
    }

    #[test]
    fn identical_inputs_give_identical_reports() {
        let first = build_report(&catalog(), &salesmen(), &lines(), &ReportFilters::default()).unwrap();
        let second = build_report(&catalog(), &salesmen(), &lines(), &ReportFilters::default()).unwrap();

        assert_eq!(first, second);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn catalog_policy_drives_bonus() {
        let policy = CommissionPolicy {
            bonus_threshold: dec!(50000),
            bonus_percent: dec!(3),
            ..CommissionPolicy::default()
        };
        let catalog = RuleCatalog::with_policy(catalog().rules().to_vec(), policy).unwrap();
        let salesmen = vec![Salesman::new(3, "Bob", "S-003", dec!(100000))];
        let lines = vec![SalesLine::new(3, "Audi", CarClass::A, 1, dec!(10000))];

        let report = build_report(&catalog, &salesmen, &lines, &ReportFilters::default()).unwrap();
        let line = &report.entries()[0].lines[0];

        assert_eq!(line.bonus_percent, dec!(3));
        assert_eq!(line.percent_commission, dec!(800));
    }

    #[test]
    fn empty_ledger_gives_empty_report() {
        let report = build_report(&catalog(), &[], &[], &ReportFilters::default()).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.summary().grand_total_commission.to_string(), "0.00");
    }
}

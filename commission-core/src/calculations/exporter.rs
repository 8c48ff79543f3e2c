//! Flat tabular projection of a [`Report`].
//!
//! One row per commission line, with the salesman's identity repeated on
//! each. A salesman without sales still gets a single row whose line fields
//! are empty and whose amounts are zero. Rows are derived from the report
//! as-is; nothing is recomputed.

use std::io::Write;
use std::iter;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{CarClass, CommissionLine, Report, SalesmanReportEntry};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub salesman_id: i64,
    pub salesman_name: String,
    pub salesman_code: String,
    pub previous_year_sales: Decimal,
    pub qualifies_for_bonus: bool,
    pub brand: Option<String>,
    pub car_class: Option<CarClass>,
    pub units_sold: Option<u32>,
    pub base_percent: Option<Decimal>,
    pub bonus_percent: Option<Decimal>,
    pub fixed_commission: Decimal,
    pub percent_commission: Decimal,
    pub line_total: Decimal,
    pub salesman_total: Decimal,
}

impl ExportRow {
    /// Column names, in field order.
    pub const HEADERS: [&'static str; 14] = [
        "salesman_id",
        "salesman_name",
        "salesman_code",
        "previous_year_sales",
        "qualifies_for_bonus",
        "brand",
        "car_class",
        "units_sold",
        "base_percent",
        "bonus_percent",
        "fixed_commission",
        "percent_commission",
        "line_total",
        "salesman_total",
    ];

    fn for_line(
        entry: &SalesmanReportEntry,
        line: &CommissionLine,
    ) -> Self {
        Self {
            brand: Some(line.brand.clone()),
            car_class: Some(line.car_class),
            units_sold: Some(line.units_sold),
            base_percent: Some(line.base_percent),
            bonus_percent: Some(line.bonus_percent),
            fixed_commission: line.fixed_commission,
            percent_commission: line.percent_commission,
            line_total: line.total_commission,
            ..Self::without_sales(entry)
        }
    }

    fn without_sales(entry: &SalesmanReportEntry) -> Self {
        let zero = Decimal::new(0, 2);
        Self {
            salesman_id: entry.salesman.id,
            salesman_name: entry.salesman.name.clone(),
            salesman_code: entry.salesman.code.clone(),
            previous_year_sales: entry.salesman.previous_year_sales,
            qualifies_for_bonus: entry.qualifies_for_bonus,
            brand: None,
            car_class: None,
            units_sold: None,
            base_percent: None,
            bonus_percent: None,
            fixed_commission: zero,
            percent_commission: zero,
            line_total: zero,
            salesman_total: entry.total_commission,
        }
    }
}

/// Lazily yields the report's rows in report order, then line order.
///
/// The iterator borrows the report and is not restartable; call again for a
/// fresh pass.
pub fn to_table(report: &Report) -> impl Iterator<Item = ExportRow> + '_ {
    report.entries().iter().flat_map(|entry| {
        let placeholder = entry
            .lines
            .is_empty()
            .then(|| ExportRow::without_sales(entry));
        entry
            .lines
            .iter()
            .map(move |line| ExportRow::for_line(entry, line))
            .chain(placeholder)
    })
}

/// Streams the report as CSV, header first, and returns the number of data
/// rows written. The header is written even when the report is empty.
///
/// # Errors
///
/// Returns [`ExportError`] if serialisation or the underlying writer fails.
pub fn write_csv<W: Write>(
    report: &Report,
    writer: W,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(ExportRow::HEADERS)?;

    let mut written = 0;
    for row in to_table(report) {
        csv_writer.serialize(&row)?;
        written += 1;
    }
    csv_writer.flush()?;

    debug!(rows = written, "exported commission report");
    Ok(written)
}

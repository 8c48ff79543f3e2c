//! Commission calculation, report aggregation and tabular export.
//!
//! Everything here is pure and synchronous: callers fetch the rule catalog
//! and ledger first, then hand in-memory snapshots to [`build_report`].

pub mod aggregator;
pub mod calculator;
pub mod common;
pub mod error;
pub mod exporter;
pub mod policy;

pub use aggregator::{build_report, sort_entries};
pub use calculator::{CommissionCalculator, compute_commission};
pub use error::CommissionError;
pub use exporter::{ExportError, ExportRow, to_table, write_csv};
pub use policy::{CommissionPolicy, ThresholdPolicy};

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::CommissionError;
use crate::models::{CarClass, ParseCodeError, Salesman};

/// Commission breakdown for one sales line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionLine {
    pub brand: String,
    pub car_class: CarClass,
    pub units_sold: u32,
    pub base_percent: Decimal,
    pub bonus_percent: Decimal,
    pub fixed_commission: Decimal,
    pub percent_commission: Decimal,
    pub total_commission: Decimal,
}

/// One salesman's lines and subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesmanReportEntry {
    pub salesman: Salesman,
    pub qualifies_for_bonus: bool,
    pub lines: Vec<CommissionLine>,
    pub total_commission: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_salesmen: usize,
    pub grand_total_commission: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    TotalCommission,
    /// Salesman name.
    Salesman,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalCommission => "total_commission",
            Self::Salesman => "salesman",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "total_commission" => Some(Self::TotalCommission),
            "salesman" => Some(Self::Salesman),
            _ => None,
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseCodeError {
            kind: "sort key",
            value: s.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseCodeError {
            kind: "sort order",
            value: s.to_string(),
        })
    }
}

/// Everything a caller can ask of a report build. Defaults to all salesmen,
/// highest total first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilters {
    pub salesman_id: Option<i64>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

/// A fully computed, sorted commission report. Only built by the
/// aggregator, so it serialises but never deserialises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    entries: Vec<SalesmanReportEntry>,
    summary: ReportSummary,
    filters: ReportFilters,
}

impl Report {
    /// Assembles a report from already-sorted entries. The summary is
    /// derived here, from the entry totals, and nowhere else.
    ///
    /// # Errors
    ///
    /// [`CommissionError::Overflow`] if the grand total leaves the `Decimal`
    /// range.
    pub(crate) fn from_sorted_entries(
        entries: Vec<SalesmanReportEntry>,
        filters: ReportFilters,
    ) -> Result<Self, CommissionError> {
        let grand_total_commission = entries
            .iter()
            .try_fold(Decimal::new(0, 2), |acc, entry| acc.checked_add(entry.total_commission))
            .ok_or_else(|| CommissionError::Overflow("report grand total".to_string()))?;
        let summary = ReportSummary {
            total_salesmen: entries.len(),
            grand_total_commission,
        };
        Ok(Self {
            entries,
            summary,
            filters,
        })
    }

    pub(crate) fn empty(filters: ReportFilters) -> Self {
        Self {
            entries: Vec::new(),
            summary: ReportSummary {
                total_salesmen: 0,
                grand_total_commission: Decimal::new(0, 2),
            },
            filters,
        }
    }

    pub fn entries(&self) -> &[SalesmanReportEntry] {
        &self.entries
    }

    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    pub fn filters(&self) -> &ReportFilters {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

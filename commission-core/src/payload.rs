//! Display payloads for the commission dashboard.
//!
//! The shapes mirror what the dashboard consumes: camelCase keys, currency
//! already formatted as `$1,234.56`, percentages and unit counts numeric.
//! Formatting happens here and only here.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::calculations::common::format_currency;
use crate::models::{CarClass, CommissionLine, CommissionRule, Report, SalesmanReportEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub report: Vec<SalesmanPayload>,
    pub summary: SummaryPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesmanPayload {
    pub salesman_id: i64,
    pub salesman_name: String,
    pub salesman_code: String,
    pub previous_year_sales: String,
    pub qualifies_for_bonus: bool,
    pub total_commission: String,
    pub commissions: Vec<CommissionPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionPayload {
    pub brand: String,
    pub car_class: String,
    pub units_sold: u32,
    pub base_percent: f64,
    pub bonus_percent: f64,
    pub fixed_commission: String,
    pub percent_commission: String,
    pub total_commission: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPayload {
    pub total_salesmen: usize,
    pub grand_total_commission: String,
}

/// One row of the "Commission Rules" reference table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePayload {
    pub brand: String,
    pub fixed_commission: String,
    pub price_threshold: String,
    pub class_a_percent: Option<f64>,
    pub class_b_percent: Option<f64>,
    pub class_c_percent: Option<f64>,
}

fn percent(value: Decimal) -> f64 {
    value.normalize().to_f64().unwrap_or_default()
}

impl From<&CommissionLine> for CommissionPayload {
    fn from(line: &CommissionLine) -> Self {
        Self {
            brand: line.brand.clone(),
            car_class: line.car_class.label().to_string(),
            units_sold: line.units_sold,
            base_percent: percent(line.base_percent),
            bonus_percent: percent(line.bonus_percent),
            fixed_commission: format_currency(line.fixed_commission),
            percent_commission: format_currency(line.percent_commission),
            total_commission: format_currency(line.total_commission),
        }
    }
}

impl From<&SalesmanReportEntry> for SalesmanPayload {
    fn from(entry: &SalesmanReportEntry) -> Self {
        Self {
            salesman_id: entry.salesman.id,
            salesman_name: entry.salesman.name.clone(),
            salesman_code: entry.salesman.code.clone(),
            previous_year_sales: format_currency(entry.salesman.previous_year_sales),
            qualifies_for_bonus: entry.qualifies_for_bonus,
            total_commission: format_currency(entry.total_commission),
            commissions: entry.lines.iter().map(CommissionPayload::from).collect(),
        }
    }
}

impl From<&Report> for ReportPayload {
    fn from(report: &Report) -> Self {
        Self {
            report: report.entries().iter().map(SalesmanPayload::from).collect(),
            summary: SummaryPayload {
                total_salesmen: report.summary().total_salesmen,
                grand_total_commission: format_currency(report.summary().grand_total_commission),
            },
        }
    }
}

impl From<&CommissionRule> for RulePayload {
    fn from(rule: &CommissionRule) -> Self {
        let class = |car_class: CarClass| rule.percent_for(car_class).map(percent);
        Self {
            brand: rule.brand.clone(),
            fixed_commission: format_currency(rule.fixed_commission),
            price_threshold: format_currency(rule.price_threshold),
            class_a_percent: class(CarClass::A),
            class_b_percent: class(CarClass::B),
            class_c_percent: class(CarClass::C),
        }
    }
}

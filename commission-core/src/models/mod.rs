mod car_class;
mod commission_rule;
mod report;
mod sales_line;
mod salesman;

pub use car_class::{CarClass, ParseCodeError};
pub use commission_rule::{CommissionRule, RuleCatalog};
pub use report::{
    CommissionLine, Report, ReportFilters, ReportSummary, SalesmanReportEntry, SortBy, SortOrder,
};
pub use sales_line::SalesLine;
pub use salesman::Salesman;

//! CSV ingestion of the commission rule catalog, the salesman roster and the
//! sales ledger into any [`commission_core::CommissionRepository`].

mod loader;

pub use loader::{
    CommissionRuleRecord, LoaderError, RuleLoader, SalesLineLoader, SalesLineRecord,
    SalesmanLoader, SalesmanRecord,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CommissionRule, SalesLine, Salesman};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Source of the rule catalog and the sales ledger.
#[async_trait]
pub trait CommissionRepository: Send + Sync {
    // Commission rules
    async fn list_commission_rules(&self) -> Result<Vec<CommissionRule>, RepositoryError>;
    async fn get_commission_rule(
        &self,
        brand: &str,
    ) -> Result<CommissionRule, RepositoryError>;
    async fn upsert_commission_rule(
        &self,
        rule: &CommissionRule,
    ) -> Result<(), RepositoryError>;

    // Salesmen
    async fn list_salesmen(&self) -> Result<Vec<Salesman>, RepositoryError>;
    async fn get_salesman(
        &self,
        id: i64,
    ) -> Result<Salesman, RepositoryError>;
    async fn upsert_salesman(
        &self,
        salesman: &Salesman,
    ) -> Result<(), RepositoryError>;

    // Sales lines
    async fn list_sales_lines(
        &self,
        salesman_id: Option<i64>,
    ) -> Result<Vec<SalesLine>, RepositoryError>;
    async fn insert_sales_line(
        &self,
        line: &SalesLine,
    ) -> Result<(), RepositoryError>;
    async fn delete_sales_lines(
        &self,
        salesman_id: i64,
    ) -> Result<u64, RepositoryError>;

    /// Rewrites the ledgers of `salesman_ids` with `lines`, in order, as one
    /// unit: on error no listed ledger has changed. Returns the number of
    /// lines inserted.
    async fn replace_sales_lines(
        &self,
        salesman_ids: &[i64],
        lines: &[SalesLine],
    ) -> Result<u64, RepositoryError>;
}

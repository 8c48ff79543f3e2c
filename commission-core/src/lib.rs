pub mod calculations;
pub mod db;
pub mod models;
pub mod payload;

pub use calculations::{CommissionError, build_report, to_table};
pub use db::repository::{CommissionRepository, RepositoryError};
pub use models::*;

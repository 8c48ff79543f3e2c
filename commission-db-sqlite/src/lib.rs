//! SQLite backend for the commission rule catalog and sales ledger.

mod decimal;
mod factory;
mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;

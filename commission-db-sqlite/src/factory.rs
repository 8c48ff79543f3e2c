use std::path::PathBuf;

use async_trait::async_trait;

use commission_core::db::repository::{CommissionRepository, RepositoryError};
use commission_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`COMMISSION_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **`$CARGO_MANIFEST_DIR/seeds`** as a last resort (dev and tests).
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("COMMISSION_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`commission_core::db::RepositoryRegistry`] to make
/// the `"sqlite"` backend available:
///
/// ```rust,no_run
/// use commission_core::db::RepositoryRegistry;
/// use commission_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory)).unwrap();
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, migrate it
    /// and apply the reference seeds.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"commissions.db"`, created if missing.
    /// * A sqlx URL such as `"sqlite:commissions.db"`.
    /// * `":memory:"` for an ephemeral database.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn CommissionRepository>, RepositoryError> {
        if config.connection_string.trim().is_empty() {
            return Err(RepositoryError::Configuration(
                "sqlite connection string is empty".to_string(),
            ));
        }

        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        repo.run_seeds(&seeds_dir())
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use commission_core::db::{DbConfig, RepositoryFactory};
    use pretty_assertions::assert_eq;

    use super::SqliteRepositoryFactory;
    use commission_core::db::repository::{CommissionRepository, RepositoryError};

    fn config(connection_string: &str) -> DbConfig {
        DbConfig {
            backend: "sqlite".to_string(),
            connection_string: connection_string.to_string(),
        }
    }

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRepositoryFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_seeded_in_memory_repository() {
        let repo = SqliteRepositoryFactory
            .create(&config(":memory:"))
            .await
            .expect("failed to create in-memory repository");

        let rules = repo.list_commission_rules().await.unwrap();

        assert!(!rules.is_empty());
        assert!(repo.list_salesmen().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_connection_string_is_a_configuration_error() {
        let result = SqliteRepositoryFactory.create(&config("  ")).await;

        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }
}

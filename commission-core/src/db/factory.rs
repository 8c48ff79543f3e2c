//! Picking the storage backend that holds the rule catalog and the sales
//! ledger.
//!
//! The report binary only knows backends by name: `[database] backend` in its
//! configuration selects one of the factories registered at startup, and that
//! factory turns `connection_string` into a [`CommissionRepository`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::repository::{CommissionRepository, RepositoryError};

/// The `[database]` table: which backend holds the ledger and how to reach
/// it. Defaults to an in-memory SQLite database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Backend name, matched case-insensitively (`"sqlite"`).
    pub backend: String,
    /// Backend-specific target; for SQLite a file such as `commissions.db`,
    /// a `sqlite:` URL, or `:memory:`.
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

impl DbConfig {
    fn backend_key(&self) -> String {
        self.backend.trim().to_ascii_lowercase()
    }
}

/// Opens a commission ledger on one kind of database. Backend crates export
/// a unit struct implementing this.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase name used in `DbConfig::backend`.
    fn backend_name(&self) -> &'static str;

    /// Opens the ledger described by `config`, creating and migrating it when
    /// the backend supports that.
    async fn create(&self, config: &DbConfig) -> Result<Box<dyn CommissionRepository>, RepositoryError>;
}

/// Ledger backends compiled into a binary, by name.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a backend.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Configuration`] if a backend with the same name is
    /// already registered; the existing one is kept.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) -> Result<(), RepositoryError> {
        let name = factory.backend_name();
        if self.factories.contains_key(name) {
            return Err(RepositoryError::Configuration(format!(
                "ledger backend '{name}' is registered twice"
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Registered backend names in alphabetical order.
    pub fn backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Opens the ledger on the backend `config.backend` names.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::Configuration`] if that backend is not
    ///   registered; the message lists the ones that are.
    /// * Whatever the backend's factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn CommissionRepository>, RepositoryError> {
        let key = config.backend_key();
        let Some(factory) = self.factories.get(key.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown ledger backend '{}'; compiled in: {}",
                config.backend,
                self.backends().join(", ")
            )));
        };

        debug!(backend = factory.backend_name(), "opening commission ledger");
        factory.create(config).await
    }
}

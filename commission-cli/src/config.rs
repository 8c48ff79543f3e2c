//! Report configuration: built-in defaults, an optional TOML file, then
//! command-line overrides, in that order of precedence.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "commissions.db"
//!
//! [report]
//! bonus_threshold = 500000
//! bonus_percent = 2
//! threshold_policy = "ungated"   # or "gate_fixed_fee"
//! sort_by = "total_commission"   # or "salesman"
//! sort_order = "desc"
//!
//! [logging]
//! level = "info"
//! file = "commission-report.log"
//! ```

use std::path::{Path, PathBuf};

use commission_core::calculations::{CommissionPolicy, ThresholdPolicy};
use commission_core::db::DbConfig;
use commission_core::{ReportFilters, SortBy, SortOrder};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_DATABASE: &str = "commissions.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DbConfig {
                backend: "sqlite".to_string(),
                connection_string: DEFAULT_DATABASE.to_string(),
            },
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Dealership-wide commission settings and the default report ordering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub bonus_threshold: Decimal,
    pub bonus_percent: Decimal,
    pub threshold_policy: ThresholdPolicy,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let policy = CommissionPolicy::default();
        Self {
            bonus_threshold: policy.bonus_threshold,
            bonus_percent: policy.bonus_percent,
            threshold_policy: policy.threshold_policy,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// A bare level or any `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: String,
    /// Append log records to this file as well as stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Values supplied on the command line. `None` leaves the configured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Reads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_overrides(
        mut self,
        overrides: ConfigOverrides,
    ) -> Self {
        if let Some(backend) = overrides.backend {
            self.database.backend = backend;
        }
        if let Some(connection_string) = overrides.connection_string {
            self.database.connection_string = connection_string;
        }
        if let Some(sort_by) = overrides.sort_by {
            self.report.sort_by = sort_by;
        }
        if let Some(sort_order) = overrides.sort_order {
            self.report.sort_order = sort_order;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if overrides.log_file.is_some() {
            self.logging.file = overrides.log_file;
        }
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a negative threshold or a bonus
    /// percentage outside [0, 100].
    pub fn policy(&self) -> Result<CommissionPolicy, ConfigError> {
        let policy = CommissionPolicy {
            bonus_threshold: self.report.bonus_threshold,
            bonus_percent: self.report.bonus_percent,
            threshold_policy: self.report.threshold_policy,
            ..CommissionPolicy::default()
        };
        policy
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(policy)
    }

    pub fn filters(
        &self,
        salesman_id: Option<i64>,
    ) -> ReportFilters {
        ReportFilters {
            salesman_id,
            sort_by: self.report.sort_by,
            sort_order: self.report.sort_order,
        }
    }
}

use thiserror::Error;

use crate::models::CarClass;

/// Errors that abort a commission computation or report build.
///
/// None of these are recovered inside the engine: a silently zeroed line
/// would produce a plausible but wrong report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommissionError {
    /// A sales line references a brand that has no commission rule.
    #[error("no commission rule for brand '{0}'")]
    UnknownBrand(String),

    /// The brand's rule carries no percentage for the line's car class.
    #[error("commission rule for brand '{brand}' has no percentage for class {car_class}")]
    UnknownClass { brand: String, car_class: CarClass },

    /// A sales line belongs to a salesman missing from the ledger.
    #[error("sales line references unknown salesman {0}")]
    UnknownSalesman(i64),

    /// The same salesman id appears more than once in the ledger.
    #[error("salesman {0} appears more than once in the ledger")]
    DuplicateSalesman(i64),

    /// A rule or policy value is outside its valid range.
    #[error("invalid commission rule for '{brand}': {reason}")]
    InvalidRule { brand: String, reason: String },

    /// An amount left the range `Decimal` can represent.
    #[error("commission amount overflowed computing {0}")]
    Overflow(String),
}

impl CommissionError {
    pub(crate) fn invalid_rule(
        brand: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRule {
            brand: brand.to_string(),
            reason: reason.into(),
        }
    }
}

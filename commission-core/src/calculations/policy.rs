//! Dealership-wide commission policy.
//!
//! Per-brand amounts live in [`CommissionRule`](crate::CommissionRule); the
//! values here apply to every brand and travel with the
//! [`RuleCatalog`](crate::RuleCatalog) so a report always uses the policy
//! that was current when its catalog was loaded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::CommissionError;
use crate::models::CarClass;

/// How a brand's price threshold interacts with its fixed commission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// The fixed fee is paid for every unit sold. The threshold is shown
    /// for reference only.
    #[default]
    Ungated,

    /// The fixed fee is paid only when the line's unit price exceeds the
    /// brand's threshold.
    GateFixedFee,
}

impl ThresholdPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ungated => "ungated",
            Self::GateFixedFee => "gate_fixed_fee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "ungated" => Some(Self::Ungated),
            "gate_fixed_fee" => Some(Self::GateFixedFee),
            _ => None,
        }
    }
}

/// Bonus tier and threshold handling shared by every brand.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use commission_core::calculations::CommissionPolicy;
///
/// let policy = CommissionPolicy::default();
///
/// assert_eq!(policy.bonus_threshold, dec!(500000));
/// assert_eq!(policy.bonus_percent, dec!(2));
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionPolicy {
    /// Prior-year sales must strictly exceed this amount to earn the bonus.
    pub bonus_threshold: Decimal,

    /// Percentage points added to the base percentage of bonus lines.
    pub bonus_percent: Decimal,

    /// The only car class the bonus applies to.
    pub bonus_class: CarClass,

    pub threshold_policy: ThresholdPolicy,
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            bonus_threshold: Decimal::new(500_000, 0),
            bonus_percent: Decimal::TWO,
            bonus_class: CarClass::A,
            threshold_policy: ThresholdPolicy::Ungated,
        }
    }
}

impl CommissionPolicy {
    /// Whether a salesman with the given prior-year sales earns the bonus.
    pub fn qualifies_for_bonus(
        &self,
        previous_year_sales: Decimal,
    ) -> bool {
        previous_year_sales > self.bonus_threshold
    }

    /// Bonus percentage points for one line.
    pub fn bonus_for(
        &self,
        qualifies_for_bonus: bool,
        car_class: CarClass,
    ) -> Decimal {
        if qualifies_for_bonus && car_class == self.bonus_class {
            self.bonus_percent
        } else {
            Decimal::ZERO
        }
    }

    /// # Errors
    ///
    /// Returns [`CommissionError::InvalidRule`] if the threshold is negative
    /// or the bonus percentage is outside [0, 100].
    pub fn validate(&self) -> Result<(), CommissionError> {
        if self.bonus_threshold < Decimal::ZERO {
            return Err(CommissionError::invalid_rule(
                "bonus policy",
                format!("bonus threshold must be non-negative, got {}", self.bonus_threshold),
            ));
        }
        if self.bonus_percent < Decimal::ZERO || self.bonus_percent > Decimal::ONE_HUNDRED {
            return Err(CommissionError::invalid_rule(
                "bonus policy",
                format!("bonus percent must be between 0 and 100, got {}", self.bonus_percent),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn bonus_requires_sales_strictly_above_threshold() {
        let policy = CommissionPolicy::default();

        assert!(!policy.qualifies_for_bonus(dec!(500000)));
        assert!(policy.qualifies_for_bonus(dec!(500001)));
        assert!(policy.qualifies_for_bonus(dec!(500000.01)));
    }

    #[test]
    fn bonus_applies_to_bonus_class_only() {
        let policy = CommissionPolicy::default();

        assert_eq!(policy.bonus_for(true, CarClass::A), dec!(2));
        assert_eq!(policy.bonus_for(true, CarClass::B), dec!(0));
        assert_eq!(policy.bonus_for(true, CarClass::C), dec!(0));
        assert_eq!(policy.bonus_for(false, CarClass::A), dec!(0));
    }

    #[test]
    fn validate_rejects_negative_threshold() {
        let policy = CommissionPolicy {
            bonus_threshold: dec!(-1),
            ..CommissionPolicy::default()
        };

        assert!(matches!(
            policy.validate(),
            Err(CommissionError::InvalidRule { .. })
        ));
    }

    #[test]
    fn validate_rejects_bonus_above_one_hundred() {
        let policy = CommissionPolicy {
            bonus_percent: dec!(100.5),
            ..CommissionPolicy::default()
        };

        assert!(policy.validate().is_err());
    }

    #[test]
    fn threshold_policy_round_trips_through_str() {
        for policy in [ThresholdPolicy::Ungated, ThresholdPolicy::GateFixedFee] {
            assert_eq!(ThresholdPolicy::parse(policy.as_str()), Some(policy));
        }
        assert_eq!(ThresholdPolicy::parse("sometimes"), None);
    }
}

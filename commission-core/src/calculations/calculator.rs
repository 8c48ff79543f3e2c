//! Per-line commission calculation.
//!
//! For one sales line the calculator produces:
//!
//! | Field                | Formula                                              |
//! |----------------------|------------------------------------------------------|
//! | `base_percent`       | rule percentage for the line's car class             |
//! | `bonus_percent`      | policy bonus if the salesman qualifies and class = A |
//! | `fixed_commission`   | rule fixed amount × units                            |
//! | `percent_commission` | (base + bonus) / 100 × price × units                 |
//! | `total_commission`   | fixed + unrounded percent, rounded once              |
//!
//! Monetary outputs are rounded half-to-even to two places.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use commission_core::calculations::compute_commission;
//! use commission_core::{CarClass, CommissionRule, SalesLine};
//!
//! let rule = CommissionRule::new("Audi", dec!(500), dec!(25000), dec!(5), dec!(3), dec!(2));
//! let line = SalesLine::new(1, "Audi", CarClass::A, 2, dec!(80000));
//!
//! let result = compute_commission(&rule, &line, true).unwrap();
//!
//! assert_eq!(result.fixed_commission, dec!(1000));
//! assert_eq!(result.bonus_percent, dec!(2));
//! assert_eq!(result.percent_commission, dec!(11200));
//! assert_eq!(result.total_commission, dec!(12200));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::round_half_even;
use crate::calculations::{CommissionError, CommissionPolicy, ThresholdPolicy};
use crate::models::{CommissionLine, CommissionRule, SalesLine};

/// Computes one line under the default [`CommissionPolicy`].
///
/// # Errors
///
/// See [`CommissionCalculator::compute`].
pub fn compute_commission(
    rule: &CommissionRule,
    line: &SalesLine,
    qualifies_for_bonus: bool,
) -> Result<CommissionLine, CommissionError> {
    CommissionCalculator::default().compute(rule, line, qualifies_for_bonus)
}

/// Stateless calculator parameterised by a [`CommissionPolicy`].
#[derive(Debug, Clone, Default)]
pub struct CommissionCalculator {
    policy: CommissionPolicy,
}

impl CommissionCalculator {
    pub fn new(policy: CommissionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CommissionPolicy {
        &self.policy
    }

    /// Computes the commission breakdown for one sales line.
    ///
    /// The caller is responsible for pairing the line with its brand's rule.
    ///
    /// # Errors
    ///
    /// * [`CommissionError::UnknownBrand`] if `rule` is not the line's brand.
    /// * [`CommissionError::UnknownClass`] if the rule has no percentage for
    ///   the line's car class.
    /// * [`CommissionError::Overflow`] if an amount exceeds the `Decimal`
    ///   range.
    pub fn compute(
        &self,
        rule: &CommissionRule,
        line: &SalesLine,
        qualifies_for_bonus: bool,
    ) -> Result<CommissionLine, CommissionError> {
        if rule.brand != line.brand {
            return Err(CommissionError::UnknownBrand(line.brand.clone()));
        }

        let base_percent = rule.percent_for(line.car_class).ok_or_else(|| {
            CommissionError::UnknownClass {
                brand: rule.brand.clone(),
                car_class: line.car_class,
            }
        })?;
        let bonus_percent = self.policy.bonus_for(qualifies_for_bonus, line.car_class);
        let units = Decimal::from(line.units_sold);
        let overflow = || CommissionError::Overflow(format!("a '{}' sales line", rule.brand));

        let fixed = self
            .fixed_commission(rule, line, units)
            .ok_or_else(overflow)?;
        let percent = base_percent
            .checked_add(bonus_percent)
            .and_then(|p| p.checked_div(Decimal::ONE_HUNDRED))
            .and_then(|rate| rate.checked_mul(line.price))
            .and_then(|amount| amount.checked_mul(units))
            .ok_or_else(overflow)?;
        let total = fixed.checked_add(percent).ok_or_else(overflow)?;

        let result = CommissionLine {
            brand: line.brand.clone(),
            car_class: line.car_class,
            units_sold: line.units_sold,
            base_percent,
            bonus_percent,
            fixed_commission: round_half_even(fixed),
            percent_commission: round_half_even(percent),
            total_commission: round_half_even(total),
        };

        debug!(
            brand = %result.brand,
            car_class = %result.car_class,
            units = result.units_sold,
            total = %result.total_commission,
            "computed commission line"
        );

        Ok(result)
    }

    fn fixed_commission(
        &self,
        rule: &CommissionRule,
        line: &SalesLine,
        units: Decimal,
    ) -> Option<Decimal> {
        match self.policy.threshold_policy {
            ThresholdPolicy::Ungated => rule.fixed_commission.checked_mul(units),
            ThresholdPolicy::GateFixedFee if line.price > rule.price_threshold => {
                rule.fixed_commission.checked_mul(units)
            }
            ThresholdPolicy::GateFixedFee => {
                debug!(
                    brand = %rule.brand,
                    price = %line.price,
                    threshold = %rule.price_threshold,
                    "unit price not above threshold; fixed commission withheld"
                );
                Some(Decimal::ZERO)
            }
        }
    }
}

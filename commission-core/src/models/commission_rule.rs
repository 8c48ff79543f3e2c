use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::{CommissionError, CommissionPolicy};
use crate::models::CarClass;

/// Commission terms for one brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub brand: String,
    /// Flat amount paid per unit sold.
    pub fixed_commission: Decimal,
    pub price_threshold: Decimal,
    /// Percentage (0 to 100) per car class.
    pub class_percent: BTreeMap<CarClass, Decimal>,
}

impl CommissionRule {
    /// Builds a rule carrying a percentage for each of the three classes.
    pub fn new(
        brand: impl Into<String>,
        fixed_commission: Decimal,
        price_threshold: Decimal,
        class_a_percent: Decimal,
        class_b_percent: Decimal,
        class_c_percent: Decimal,
    ) -> Self {
        Self {
            brand: brand.into(),
            fixed_commission,
            price_threshold,
            class_percent: BTreeMap::from([
                (CarClass::A, class_a_percent),
                (CarClass::B, class_b_percent),
                (CarClass::C, class_c_percent),
            ]),
        }
    }

    pub fn percent_for(
        &self,
        car_class: CarClass,
    ) -> Option<Decimal> {
        self.class_percent.get(&car_class).copied()
    }

    /// # Errors
    ///
    /// Returns [`CommissionError::InvalidRule`] if the brand is blank, an
    /// amount is negative, or a percentage is outside [0, 100].
    pub fn validate(&self) -> Result<(), CommissionError> {
        if self.brand.trim().is_empty() {
            return Err(CommissionError::invalid_rule(&self.brand, "brand must not be blank"));
        }
        if self.fixed_commission < Decimal::ZERO {
            return Err(CommissionError::invalid_rule(
                &self.brand,
                format!("fixed commission must be non-negative, got {}", self.fixed_commission),
            ));
        }
        if self.price_threshold < Decimal::ZERO {
            return Err(CommissionError::invalid_rule(
                &self.brand,
                format!("price threshold must be non-negative, got {}", self.price_threshold),
            ));
        }
        for (car_class, percent) in &self.class_percent {
            if *percent < Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                return Err(CommissionError::invalid_rule(
                    &self.brand,
                    format!("class {car_class} percent must be between 0 and 100, got {percent}"),
                ));
            }
        }
        Ok(())
    }
}

/// Validated set of commission rules keyed by brand, plus the policy that
/// applies to all of them.
///
/// Rules keep the order they were supplied in.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: Vec<CommissionRule>,
    by_brand: HashMap<String, usize>,
    policy: CommissionPolicy,
}

impl RuleCatalog {
    /// Builds a catalog with the default [`CommissionPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`CommissionError::InvalidRule`] if any rule fails validation
    /// or two rules share a brand.
    pub fn new(rules: Vec<CommissionRule>) -> Result<Self, CommissionError> {
        Self::with_policy(rules, CommissionPolicy::default())
    }

    /// # Errors
    ///
    /// As [`RuleCatalog::new`], and also when the policy is invalid.
    pub fn with_policy(
        rules: Vec<CommissionRule>,
        policy: CommissionPolicy,
    ) -> Result<Self, CommissionError> {
        policy.validate()?;

        let mut by_brand = HashMap::with_capacity(rules.len());
        for (idx, rule) in rules.iter().enumerate() {
            rule.validate()?;
            if by_brand.insert(rule.brand.clone(), idx).is_some() {
                return Err(CommissionError::invalid_rule(&rule.brand, "duplicate brand"));
            }
        }

        Ok(Self {
            rules,
            by_brand,
            policy,
        })
    }

    pub fn get(
        &self,
        brand: &str,
    ) -> Option<&CommissionRule> {
        self.by_brand.get(brand).map(|&idx| &self.rules[idx])
    }

    pub fn rules(&self) -> &[CommissionRule] {
        &self.rules
    }

    pub fn policy(&self) -> &CommissionPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::{LoanDeskError, LoanDeskResult};

/// Parameters of the rate card. Defaults reproduce the published card:
/// 15% base, +2 points above 12 months, -1 point above 50,000.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatePolicy {
    pub base_rate: Percent,
    /// Tenures strictly longer than this attract the premium
    pub long_tenure_threshold: Months,
    pub long_tenure_premium: Percent,
    /// Amounts strictly above this earn the discount
    pub large_amount_threshold: Money,
    pub large_amount_discount: Percent,
    pub min_rate: Percent,
    pub max_rate: Percent,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            base_rate: dec!(15),
            long_tenure_threshold: 12,
            long_tenure_premium: dec!(2),
            large_amount_threshold: dec!(50000),
            large_amount_discount: dec!(1),
            min_rate: Decimal::ZERO,
            max_rate: dec!(100),
        }
    }
}

/// Everything a deployment can tune without a rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingPolicy {
    pub rate: RatePolicy,
    pub interest_method: InterestMethod,
    pub page_size: usize,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            rate: RatePolicy::default(),
            interest_method: InterestMethod::Flat,
            page_size: 10,
        }
    }
}

impl RatePolicy {
    /// Bounds must be ordered and non-negative.
    pub fn validate(&self) -> LoanDeskResult<()> {
        if self.min_rate > self.max_rate {
            return Err(LoanDeskError::InvalidInput {
                field: "rate.min_rate".into(),
                reason: format!("Floor {}% exceeds ceiling {}%.", self.min_rate, self.max_rate),
            });
        }
        if self.min_rate < Decimal::ZERO {
            return Err(LoanDeskError::InvalidInput {
                field: "rate.min_rate".into(),
                reason: "Rate floor cannot be negative.".into(),
            });
        }
        Ok(())
    }
}

impl LendingPolicy {
    pub fn validate(&self) -> LoanDeskResult<()> {
        self.rate.validate()?;
        if self.page_size == 0 {
            return Err(LoanDeskError::InvalidInput {
                field: "page_size".into(),
                reason: "Page size must be at least 1.".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(LendingPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_partial_policy_fills_defaults() {
        let policy: LendingPolicy =
            serde_json::from_str(r#"{"rate": {"base_rate": "12.5"}, "page_size": 25}"#).unwrap();
        assert_eq!(policy.rate.base_rate, dec!(12.5));
        assert_eq!(policy.rate.long_tenure_premium, dec!(2));
        assert_eq!(policy.page_size, 25);
        assert_eq!(policy.interest_method, InterestMethod::Flat);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut policy = LendingPolicy::default();
        policy.rate.min_rate = dec!(30);
        policy.rate.max_rate = dec!(20);
        match policy.validate().unwrap_err() {
            LoanDeskError::InvalidInput { field, .. } => assert_eq!(field, "rate.min_rate"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let policy = LendingPolicy {
            page_size: 0,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }
}

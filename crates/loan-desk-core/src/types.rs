use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::LoanDeskError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Annual interest rates in percentage points (15 = 15% p.a.).
pub type Percent = Decimal;

/// Month counts
pub type Months = u32;

/// Decimal places of the smallest currency unit.
pub const MONEY_DP: u32 = 2;

/// Decimal places a quoted rate is carried at.
pub const RATE_DP: u32 = 1;

/// Round to the smallest currency unit, half away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a rate to one decimal place, half away from zero.
pub fn round_rate(value: Percent) -> Percent {
    value.round_dp_with_strategy(RATE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Loan repayment duration offered to applicants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Tenure {
    Six,
    Twelve,
    TwentyFour,
    ThirtySix,
}

impl Tenure {
    pub const ALL: [Tenure; 4] = [
        Tenure::Six,
        Tenure::Twelve,
        Tenure::TwentyFour,
        Tenure::ThirtySix,
    ];

    pub fn months(self) -> Months {
        match self {
            Tenure::Six => 6,
            Tenure::Twelve => 12,
            Tenure::TwentyFour => 24,
            Tenure::ThirtySix => 36,
        }
    }
}

impl TryFrom<u32> for Tenure {
    type Error = LoanDeskError;

    fn try_from(months: u32) -> Result<Self, Self::Error> {
        Tenure::ALL
            .into_iter()
            .find(|t| t.months() == months)
            .ok_or_else(|| LoanDeskError::InvalidInput {
                field: "tenure".into(),
                reason: format!("{months} months is not offered; choose 6, 12, 24 or 36"),
            })
    }
}

impl From<Tenure> for u32 {
    fn from(t: Tenure) -> Self {
        t.months()
    }
}

impl std::fmt::Display for Tenure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} months", self.months())
    }
}

/// What the borrower says the money is for. On the wire it is a plain
/// string: known categories match case-insensitively, anything else is
/// kept as free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LoanPurpose {
    Business,
    Education,
    Medical,
    #[default]
    Personal,
    Other(String),
}

impl From<String> for LoanPurpose {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "business" => Self::Business,
            "education" => Self::Education,
            "medical" => Self::Medical,
            "personal" => Self::Personal,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl From<LoanPurpose> for String {
    fn from(p: LoanPurpose) -> Self {
        p.to_string()
    }
}

impl std::fmt::Display for LoanPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Business => write!(f, "business"),
            Self::Education => write!(f, "education"),
            Self::Medical => write!(f, "medical"),
            Self::Personal => write!(f, "personal"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// How interest accrues over the life of a loan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestMethod {
    /// Simple interest on the original principal, spread evenly over the tenure
    #[default]
    Flat,
    /// Level annuity: monthly interest on the outstanding balance
    Amortizing,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(4791.665)), dec!(4791.67));
        assert_eq!(round_money(dec!(4791.6666)), dec!(4791.67));
        assert_eq!(round_money(dec!(-0.005)), dec!(-0.01));
    }

    #[test]
    fn test_tenure_from_months() {
        assert_eq!(Tenure::try_from(24).unwrap(), Tenure::TwentyFour);
        assert!(Tenure::try_from(18).is_err());
    }

    #[test]
    fn test_tenure_serde_as_integer() {
        let t: Tenure = serde_json::from_str("36").unwrap();
        assert_eq!(t, Tenure::ThirtySix);
        assert_eq!(serde_json::to_string(&Tenure::Six).unwrap(), "6");
        assert!(serde_json::from_str::<Tenure>("7").is_err());
    }

    #[test]
    fn test_purpose_lowercase() {
        let p: LoanPurpose = serde_json::from_str("\"medical\"").unwrap();
        assert_eq!(p, LoanPurpose::Medical);
    }

    #[test]
    fn test_purpose_category_case_insensitive() {
        let p: LoanPurpose = serde_json::from_str("\"Business\"").unwrap();
        assert_eq!(p, LoanPurpose::Business);
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"business\"");
    }

    #[test]
    fn test_purpose_free_text() {
        let p: LoanPurpose = serde_json::from_str("\" Home renovation \"").unwrap();
        assert_eq!(p, LoanPurpose::Other("Home renovation".into()));
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"Home renovation\"");
    }
}

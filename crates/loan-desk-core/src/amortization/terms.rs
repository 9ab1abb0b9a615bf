use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::types::*;
use crate::{LoanDeskError, LoanDeskResult};

/// Converts an annual percentage into a monthly fraction (rate / 12 / 100).
const MONTHLY_DIVISOR: Decimal = dec!(1200);

/// Longest tenure a schedule is laid out for (100 years).
pub const MAX_TENURE_MONTHS: Months = 1200;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermsInput {
    pub principal: Money,
    pub tenure_months: Months,
    /// Annual rate in percent
    pub annual_rate: Percent,
    #[serde(default)]
    pub method: InterestMethod,
}

/// Headline numbers of a loan. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub tenure_months: Months,
    pub annual_rate: Percent,
    pub method: InterestMethod,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_payable: Money,
}

/// One installment split into its interest and principal portions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Installment {
    pub amount: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance_after: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Flat-interest terms: `principal * rate * months / 1200` spread evenly.
pub fn compute_terms(
    principal: Money,
    tenure_months: Months,
    annual_rate: Percent,
) -> LoanDeskResult<LoanTerms> {
    compute_terms_with_method(principal, tenure_months, annual_rate, InterestMethod::Flat)
}

pub fn compute_terms_with_method(
    principal: Money,
    tenure_months: Months,
    annual_rate: Percent,
    method: InterestMethod,
) -> LoanDeskResult<LoanTerms> {
    validate(principal, tenure_months, annual_rate)?;

    let terms = match method {
        InterestMethod::Flat => {
            let total_interest = principal
                .checked_mul(annual_rate)
                .and_then(|v| v.checked_mul(Decimal::from(tenure_months)))
                .map(|v| round_money(v / MONTHLY_DIVISOR))
                .ok_or_else(|| out_of_range("total interest"))?;
            let total_payable = principal
                .checked_add(total_interest)
                .ok_or_else(|| out_of_range("total payable"))?;
            let terms = LoanTerms {
                principal,
                tenure_months,
                annual_rate,
                method,
                monthly_payment: round_money(total_payable / Decimal::from(tenure_months)),
                total_interest,
                total_payable,
            };
            installments(&terms)?;
            terms
        }
        InterestMethod::Amortizing => {
            let monthly_payment = annuity_payment(principal, tenure_months, annual_rate)?;
            let mut terms = LoanTerms {
                principal,
                tenure_months,
                annual_rate,
                method,
                monthly_payment,
                total_interest: Decimal::ZERO,
                total_payable: Decimal::ZERO,
            };
            // Rounded installments drift from the closed form; the
            // schedule's own sum is the payable amount.
            let total_payable: Money = installments(&terms)?.iter().map(|i| i.amount).sum();
            terms.total_payable = total_payable;
            terms.total_interest = total_payable - principal;
            terms
        }
    };

    debug!(
        %principal,
        tenure_months,
        %annual_rate,
        monthly_payment = %terms.monthly_payment,
        total_payable = %terms.total_payable,
        "loan terms computed"
    );
    Ok(terms)
}

/// Terms wrapped in the standard output envelope.
pub fn calculate_terms(input: &TermsInput) -> LoanDeskResult<ComputationOutput<LoanTerms>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = compute_terms_with_method(
        input.principal,
        input.tenure_months,
        input.annual_rate,
        input.method,
    )?;

    if input.annual_rate.is_zero() {
        warnings.push("Zero interest rate; payments repay principal only.".into());
    }
    if Tenure::try_from(input.tenure_months).is_err() {
        warnings.push(format!(
            "{} months is outside the offered tenures (6, 12, 24, 36).",
            input.tenure_months
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "method": input.method,
        "rounding": "2 dp, half away from zero",
        "final_installment": "absorbs rounding remainder",
    });

    Ok(with_metadata(
        methodology(input.method),
        &assumptions,
        warnings,
        elapsed,
        terms,
    ))
}

pub(crate) fn methodology(method: InterestMethod) -> &'static str {
    match method {
        InterestMethod::Flat => "Flat interest: principal x rate x months / 1200, equal installments",
        InterestMethod::Amortizing => "Level annuity: P r (1+r)^n / ((1+r)^n - 1), r = rate / 1200",
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate(principal: Money, tenure_months: Months, annual_rate: Percent) -> LoanDeskResult<()> {
    if principal <= Decimal::ZERO {
        return Err(LoanDeskError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive.".into(),
        });
    }
    if tenure_months == 0 || tenure_months > MAX_TENURE_MONTHS {
        return Err(LoanDeskError::InvalidInput {
            field: "tenure_months".into(),
            reason: format!("Tenure must be between 1 and {MAX_TENURE_MONTHS} months."),
        });
    }
    if annual_rate < Decimal::ZERO {
        return Err(LoanDeskError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Interest rate cannot be negative.".into(),
        });
    }
    Ok(())
}

fn annuity_payment(
    principal: Money,
    tenure_months: Months,
    annual_rate: Percent,
) -> LoanDeskResult<Money> {
    let n = Decimal::from(tenure_months);
    if annual_rate.is_zero() {
        return Ok(round_money(principal / n));
    }

    let r = annual_rate / MONTHLY_DIVISOR;
    let growth = (Decimal::ONE + r)
        .checked_powu(u64::from(tenure_months))
        .ok_or_else(|| out_of_range("annuity growth factor"))?;
    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        return Err(LoanDeskError::DivisionByZero {
            context: "annuity factor".into(),
        });
    }
    principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(growth))
        .and_then(|v| v.checked_div(denominator))
        .map(round_money)
        .ok_or_else(|| out_of_range("monthly payment"))
}

fn out_of_range(what: &str) -> LoanDeskError {
    LoanDeskError::InvalidInput {
        field: "principal".into(),
        reason: format!("{what} exceeds the representable range; reduce principal, rate or tenure."),
    }
}

/// Split the terms into installments. The final installment absorbs every
/// rounding remainder so the installments sum to `total_payable` and the
/// balance ends at exactly zero.
pub(crate) fn installments(terms: &LoanTerms) -> LoanDeskResult<Vec<Installment>> {
    let n = terms.tenure_months;
    let mut out = Vec::with_capacity(n as usize);
    let mut balance = terms.principal;

    match terms.method {
        InterestMethod::Flat => {
            let monthly_interest = round_money(terms.total_interest / Decimal::from(n));
            let mut interest_left = terms.total_interest;
            let mut payable_left = terms.total_payable;

            for month in 1..=n {
                let (amount, interest) = if month == n {
                    (payable_left, interest_left)
                } else {
                    (terms.monthly_payment, monthly_interest)
                };
                let principal = amount - interest;
                balance -= principal;
                interest_left -= interest;
                payable_left -= amount;
                out.push(Installment {
                    amount,
                    interest,
                    principal,
                    balance_after: balance,
                });
            }
        }
        InterestMethod::Amortizing => {
            let r = terms.annual_rate / MONTHLY_DIVISOR;
            for month in 1..=n {
                let interest = balance
                    .checked_mul(r)
                    .map(round_money)
                    .ok_or_else(|| out_of_range("monthly interest"))?;
                let principal = if month == n {
                    balance
                } else {
                    (terms.monthly_payment - interest).min(balance)
                };
                balance -= principal;
                out.push(Installment {
                    amount: principal + interest,
                    interest,
                    principal,
                    balance_after: balance,
                });
            }
        }
    }

    if out.iter().any(|i| i.amount <= Decimal::ZERO || i.principal < Decimal::ZERO) {
        return Err(LoanDeskError::InvalidInput {
            field: "principal".into(),
            reason: format!(
                "{} is too small to spread over {} installments.",
                terms.principal, n
            ),
        });
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_terms_reference_case() {
        let t = compute_terms(dec!(50000), 12, dec!(15)).unwrap();
        // 50000 x 15 x 12 / 1200 = 7500
        assert_eq!(t.total_interest, dec!(7500));
        assert_eq!(t.total_payable, dec!(57500));
        // 57500 / 12 = 4791.666...
        assert_eq!(t.monthly_payment, dec!(4791.67));
    }

    #[test]
    fn test_flat_installments_absorb_remainder() {
        let t = compute_terms(dec!(50000), 12, dec!(15)).unwrap();
        let inst = installments(&t).unwrap();
        assert_eq!(inst.len(), 12);
        let total: Money = inst.iter().map(|i| i.amount).sum();
        assert_eq!(total, dec!(57500));
        // 11 x 4791.67 = 52708.37, leaving 4791.63
        assert_eq!(inst[11].amount, dec!(4791.63));
        assert_eq!(inst[11].balance_after, Decimal::ZERO);
        let interest: Money = inst.iter().map(|i| i.interest).sum();
        assert_eq!(interest, dec!(7500));
    }

    #[test]
    fn test_amortizing_payment() {
        // 10,000 over 12 months at 12%: r = 1%, payment = 888.49
        let t = compute_terms_with_method(dec!(10000), 12, dec!(12), InterestMethod::Amortizing)
            .unwrap();
        assert_eq!(t.monthly_payment, dec!(888.49));
        let inst = installments(&t).unwrap();
        assert_eq!(inst[0].interest, dec!(100));
        assert_eq!(inst.last().unwrap().balance_after, Decimal::ZERO);
        let total: Money = inst.iter().map(|i| i.amount).sum();
        assert_eq!(total, t.total_payable);
        assert_eq!(t.total_interest, t.total_payable - dec!(10000));
    }

    #[test]
    fn test_amortizing_zero_rate() {
        let t = compute_terms_with_method(dec!(1200), 12, Decimal::ZERO, InterestMethod::Amortizing)
            .unwrap();
        assert_eq!(t.monthly_payment, dec!(100));
        assert_eq!(t.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_zero_tenure_rejected() {
        match compute_terms(dec!(1000), 0, dec!(15)).unwrap_err() {
            LoanDeskError::InvalidInput { field, .. } => assert_eq!(field, "tenure_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_principal_rejected() {
        assert!(compute_terms(Decimal::ZERO, 12, dec!(15)).is_err());
        assert!(compute_terms(dec!(-5), 12, dec!(15)).is_err());
    }

    #[test]
    fn test_negative_rate_rejected() {
        match compute_terms(dec!(1000), 12, dec!(-1)).unwrap_err() {
            LoanDeskError::InvalidInput { field, .. } => assert_eq!(field, "annual_rate"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_dust_principal_rejected() {
        match compute_terms(dec!(0.05), 36, Decimal::ZERO).unwrap_err() {
            LoanDeskError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
        let input = TermsInput {
            principal: dec!(0.05),
            tenure_months: 36,
            annual_rate: dec!(15),
            method: InterestMethod::Flat,
        };
        assert!(calculate_terms(&input).is_err());
    }

    #[test]
    fn test_tenure_above_cap_rejected() {
        let input = TermsInput {
            principal: dec!(10000),
            tenure_months: 10_000,
            annual_rate: dec!(12),
            method: InterestMethod::Amortizing,
        };
        match calculate_terms(&input).unwrap_err() {
            LoanDeskError::InvalidInput { field, .. } => assert_eq!(field, "tenure_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
        assert!(compute_terms(dec!(10000), u32::MAX, dec!(12)).is_err());
    }

    #[test]
    fn test_annuity_growth_overflow_is_an_error() {
        // (1 + 10)^1200 is far outside Decimal range
        let err = compute_terms_with_method(
            dec!(10000),
            MAX_TENURE_MONTHS,
            dec!(12000),
            InterestMethod::Amortizing,
        )
        .unwrap_err();
        assert!(matches!(err, LoanDeskError::InvalidInput { .. }));
    }

    #[test]
    fn test_flat_interest_overflow_is_an_error() {
        // 1e27 x 15 x 36 exceeds Decimal::MAX
        let err = compute_terms(dec!(1000000000000000000000000000), 36, dec!(15)).unwrap_err();
        match err {
            LoanDeskError::InvalidInput { field, reason } => {
                assert_eq!(field, "principal");
                assert!(reason.contains("total interest"));
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_flags_unoffered_tenure() {
        let input = TermsInput {
            principal: dec!(10000),
            tenure_months: 18,
            annual_rate: dec!(17),
            method: InterestMethod::Flat,
        };
        let out = calculate_terms(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("18 months")));
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::rate::{price_rate, RateQuote};
use crate::amortization::schedule::{build_schedule, ScheduleEntry};
use crate::amortization::terms::{compute_terms_with_method, LoanTerms};
use crate::policy::LendingPolicy;
use crate::types::*;
use crate::{LoanDeskError, LoanDeskResult};

/// What an applicant submits on the application form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanQuoteRequest {
    pub principal: Money,
    pub tenure: Tenure,
    #[serde(default)]
    pub purpose: LoanPurpose,
    pub application_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanQuote {
    pub purpose: LoanPurpose,
    pub rate: RateQuote,
    pub terms: LoanTerms,
    pub schedule: Vec<ScheduleEntry>,
    /// Regular installment as a share of stated monthly income
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_to_income: Option<Decimal>,
}

/// Price an application end to end: rate card, terms, dated schedule.
pub fn quote_loan(
    request: &LoanQuoteRequest,
    policy: &LendingPolicy,
) -> LoanDeskResult<ComputationOutput<LoanQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    policy.validate()?;
    validate_request(request)?;

    let months = request.tenure.months();
    let rate = price_rate(request.principal, months, &policy.rate);
    if rate.clamped {
        warnings.push(format!(
            "Rate {}% clamped to {}% by policy.",
            rate.unclamped_rate, rate.rate
        ));
    }

    let terms = compute_terms_with_method(request.principal, months, rate.rate, policy.interest_method)?;
    let schedule = build_schedule(&terms, request.application_date)?;

    let payment_to_income = match request.monthly_income {
        Some(income) if income > Decimal::ZERO => {
            let ratio = (terms.monthly_payment / income).round_dp(4);
            if terms.monthly_payment > income {
                warnings.push(format!(
                    "Monthly payment {} exceeds stated monthly income {}.",
                    terms.monthly_payment, income
                ));
            }
            Some(ratio)
        }
        Some(_) => {
            warnings.push("Monthly income is zero; affordability not assessed.".into());
            None
        }
        None => None,
    };

    debug!(
        principal = %request.principal,
        tenure = months,
        rate = %rate.rate,
        purpose = %request.purpose,
        "loan quoted"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "policy": policy,
        "application_date": request.application_date,
    });

    Ok(with_metadata(
        "Loan quote: rate card, then terms and schedule at the quoted rate",
        &assumptions,
        warnings,
        elapsed,
        LoanQuote {
            purpose: request.purpose.clone(),
            rate,
            terms,
            schedule,
            payment_to_income,
        },
    ))
}

fn validate_request(request: &LoanQuoteRequest) -> LoanDeskResult<()> {
    if request.principal <= Decimal::ZERO {
        return Err(LoanDeskError::InvalidInput {
            field: "principal".into(),
            reason: "Loan amount must be positive.".into(),
        });
    }
    if let LoanPurpose::Other(text) = &request.purpose {
        if text.trim().is_empty() {
            return Err(LoanDeskError::InvalidInput {
                field: "purpose".into(),
                reason: "Loan purpose is required.".into(),
            });
        }
    }
    if matches!(request.monthly_income, Some(income) if income < Decimal::ZERO) {
        return Err(LoanDeskError::InvalidInput {
            field: "monthly_income".into(),
            reason: "Monthly income cannot be negative.".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> LoanQuoteRequest {
        LoanQuoteRequest {
            principal: dec!(60000),
            tenure: Tenure::TwentyFour,
            purpose: LoanPurpose::Business,
            application_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            monthly_income: Some(dec!(10000)),
        }
    }

    #[test]
    fn test_quote_uses_rate_card() {
        let out = quote_loan(&request(), &LendingPolicy::default()).unwrap();
        let q = &out.result;
        assert_eq!(q.rate.rate, dec!(16));
        // 60000 x 16 x 24 / 1200 = 19200
        assert_eq!(q.terms.total_interest, dec!(19200));
        assert_eq!(q.terms.total_payable, dec!(79200));
        assert_eq!(q.terms.monthly_payment, dec!(3300));
        assert_eq!(q.schedule.len(), 24);
        assert_eq!(q.payment_to_income, Some(dec!(0.33)));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_quote_warns_when_unaffordable() {
        let mut req = request();
        req.monthly_income = Some(dec!(2000));
        let out = quote_loan(&req, &LendingPolicy::default()).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("exceeds")));
    }

    #[test]
    fn test_quote_rejects_blank_other_purpose() {
        let mut req = request();
        req.purpose = LoanPurpose::Other("  ".into());
        match quote_loan(&req, &LendingPolicy::default()).unwrap_err() {
            LoanDeskError::InvalidInput { field, .. } => assert_eq!(field, "purpose"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_request_rejects_unoffered_tenure() {
        let json = r#"{"principal": "10000", "tenure": 18, "purpose": "education",
                       "application_date": "2024-03-15"}"#;
        assert!(serde_json::from_str::<LoanQuoteRequest>(json).is_err());
    }

    #[test]
    fn test_amortizing_policy() {
        let policy = LendingPolicy {
            interest_method: InterestMethod::Amortizing,
            ..Default::default()
        };
        let out = quote_loan(&request(), &policy).unwrap();
        assert_eq!(out.result.terms.method, InterestMethod::Amortizing);
        // Declining-balance interest is below the flat equivalent
        assert!(out.result.terms.total_interest < dec!(19200));
    }
}

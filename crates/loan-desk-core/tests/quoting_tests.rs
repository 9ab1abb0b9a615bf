use chrono::NaiveDate;
use loan_desk_core::amortization::{schedule, terms};
use loan_desk_core::quoting::{quote, rate};
use loan_desk_core::{InterestMethod, LendingPolicy, LoanDeskError, LoanPurpose, Money, RatePolicy, Tenure};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Rate card
// ===========================================================================

#[test]
fn test_rate_card_published_values() {
    assert_eq!(rate::quote_rate(dec!(10000), 12), dec!(15));
    assert_eq!(rate::quote_rate(dec!(10000), 24), dec!(17));
    assert_eq!(rate::quote_rate(dec!(60000), 12), dec!(14));
    assert_eq!(rate::quote_rate(dec!(60000), 24), dec!(16));
}

#[test]
fn test_rate_for_every_offered_tenure() {
    let rates: Vec<Decimal> = Tenure::ALL
        .iter()
        .map(|t| rate::quote_rate(dec!(20000), t.months()))
        .collect();
    assert_eq!(rates, vec![dec!(15), dec!(15), dec!(17), dec!(17)]);
}

#[test]
fn test_custom_policy_card() {
    let policy = RatePolicy {
        base_rate: dec!(12.5),
        long_tenure_premium: dec!(1.5),
        ..Default::default()
    };
    let q = rate::price_rate(dec!(80000), 36, &policy);
    // 12.5 + 1.5 - 1 = 13
    assert_eq!(q.rate, dec!(13));
    assert_eq!(q.base_rate, dec!(12.5));
}

// ===========================================================================
// Terms and schedule
// ===========================================================================

#[test]
fn test_reference_terms() {
    let t = terms::compute_terms(dec!(50000), 12, dec!(15)).unwrap();
    assert_eq!(t.total_interest, dec!(7500));
    assert_eq!(t.total_payable, dec!(57500));
    assert_eq!(t.monthly_payment, dec!(4791.67));
}

#[test]
fn test_schedule_sums_to_total_payable_across_tenures() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    for tenure in Tenure::ALL {
        for principal in [dec!(1000), dec!(33333.33), dec!(50000), dec!(123456.78)] {
            let r = rate::quote_rate(principal, tenure.months());
            for method in [InterestMethod::Flat, InterestMethod::Amortizing] {
                let t = terms::compute_terms_with_method(principal, tenure.months(), r, method)
                    .unwrap();
                let s = schedule::build_schedule(&t, start).unwrap();
                assert_eq!(s.len() as u32, tenure.months());
                let total: Money = s.iter().map(|e| e.amount).sum();
                assert_eq!(total, t.total_payable, "{principal} over {tenure} ({method:?})");
                assert_eq!(s.last().unwrap().balance_after, Decimal::ZERO);
            }
        }
    }
}

#[test]
fn test_zero_tenure_is_validation_error() {
    let err = terms::compute_terms(dec!(50000), 0, dec!(15)).unwrap_err();
    assert!(matches!(err, LoanDeskError::InvalidInput { ref field, .. } if field == "tenure_months"));
}

// ===========================================================================
// Application quote
// ===========================================================================

#[test]
fn test_quote_from_json_request() {
    let json = r#"{
        "principal": "10000",
        "tenure": 12,
        "purpose": "education",
        "application_date": "2024-03-15"
    }"#;
    let request: quote::LoanQuoteRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.purpose, LoanPurpose::Education);

    let out = quote::quote_loan(&request, &LendingPolicy::default()).unwrap();
    let q = &out.result;
    assert_eq!(q.rate.rate, dec!(15));
    // 10000 x 15 x 12 / 1200 = 1500
    assert_eq!(q.terms.total_interest, dec!(1500));
    assert_eq!(q.terms.monthly_payment, dec!(958.33));
    assert_eq!(q.schedule[0].due_date, NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
    assert_eq!(q.schedule[11].amount, dec!(958.37));
    assert!(q.payment_to_income.is_none());
}

#[test]
fn test_quote_accepts_free_text_purpose() {
    let json = r#"{
        "principal": "60000",
        "tenure": 24,
        "purpose": "Home renovation",
        "application_date": "2024-03-15"
    }"#;
    let request: quote::LoanQuoteRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.purpose, LoanPurpose::Other("Home renovation".into()));

    let out = quote::quote_loan(&request, &LendingPolicy::default()).unwrap();
    // 15 + 2 - 1
    assert_eq!(out.result.rate.rate, dec!(16));
    let echoed = serde_json::to_value(&out.result).unwrap();
    assert_eq!(echoed["purpose"], "Home renovation");
}

#[test]
fn test_terms_out_of_range_is_an_error_not_a_panic() {
    let err = terms::calculate_terms(&terms::TermsInput {
        principal: dec!(10000),
        tenure_months: 10_000,
        annual_rate: dec!(12),
        method: InterestMethod::Amortizing,
    })
    .unwrap_err();
    assert!(matches!(err, LoanDeskError::InvalidInput { ref field, .. } if field == "tenure_months"));

    let err = terms::compute_terms(dec!(1000000000000000000000000000), 36, dec!(15)).unwrap_err();
    assert!(matches!(err, LoanDeskError::InvalidInput { .. }));
}

#[test]
fn test_quote_rejects_bad_policy() {
    let request = quote::LoanQuoteRequest {
        principal: dec!(10000),
        tenure: Tenure::Six,
        purpose: LoanPurpose::Personal,
        application_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        monthly_income: None,
    };
    let policy = LendingPolicy {
        page_size: 0,
        ..Default::default()
    };
    assert!(quote::quote_loan(&request, &policy).is_err());
}

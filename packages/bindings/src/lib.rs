use chrono::NaiveDateTime;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use loan_desk_core::servicing::loan::{Loan, LoanStatus, ReviewDecision};
use loan_desk_core::servicing::session::Session;
use loan_desk_core::servicing::transaction::{Transaction, TransactionStatus};
use loan_desk_core::LendingPolicy;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn policy_from(policy_json: Option<String>) -> NapiResult<LendingPolicy> {
    let policy: LendingPolicy = match policy_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => LendingPolicy::default(),
    };
    policy.validate().map_err(to_napi_error)?;
    Ok(policy)
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// `policy_json`, when given, replaces the input's own `policy` field.
#[napi]
pub fn quote_rate(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let mut input: loan_desk_core::quoting::rate::RateQuoteInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    if policy_json.is_some() {
        input.policy = policy_from(policy_json)?.rate;
    }
    let output =
        loan_desk_core::quoting::rate::calculate_rate_quote(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn quote_loan(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let request: loan_desk_core::quoting::quote::LoanQuoteRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output =
        loan_desk_core::quoting::quote::quote_loan(&request, &policy).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn loan_terms(input_json: String) -> NapiResult<String> {
    let input: loan_desk_core::amortization::terms::TermsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_desk_core::amortization::terms::calculate_terms(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn repayment_schedule(input_json: String) -> NapiResult<String> {
    let input: loan_desk_core::amortization::schedule::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_desk_core::amortization::schedule::calculate_schedule(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Servicing
// ---------------------------------------------------------------------------

#[napi]
pub fn loan_progress(input_json: String) -> NapiResult<String> {
    let input: loan_desk_core::servicing::progress::LoanProgressInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_desk_core::servicing::progress::calculate_loan_progress(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ReviewRequest {
    session: Session,
    loan: Loan,
    decision: ReviewDecision,
    at: NaiveDateTime,
}

#[napi]
pub fn review_loan(input_json: String) -> NapiResult<String> {
    let req: ReviewRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let reviewed =
        loan_desk_core::servicing::loan::review_loan(&req.session, &req.loan, req.decision, req.at)
            .map_err(to_napi_error)?;
    serde_json::to_string(&reviewed).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct AdvanceRequest {
    loan: Loan,
    to: LoanStatus,
    at: NaiveDateTime,
}

#[napi]
pub fn advance_loan(input_json: String) -> NapiResult<String> {
    let req: AdvanceRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let advanced = loan_desk_core::servicing::loan::transition_loan(&req.loan, req.to, req.at)
        .map_err(to_napi_error)?;
    serde_json::to_string(&advanced).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct SettleRequest {
    transaction: Transaction,
    to: TransactionStatus,
}

#[napi]
pub fn settle_transaction(input_json: String) -> NapiResult<String> {
    let req: SettleRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let settled =
        loan_desk_core::servicing::transaction::transition_transaction(&req.transaction, req.to)
            .map_err(to_napi_error)?;
    serde_json::to_string(&settled).map_err(to_napi_error)
}

#[napi]
pub fn portfolio_summary(input_json: String) -> NapiResult<String> {
    let input: loan_desk_core::servicing::summary::PortfolioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_desk_core::servicing::summary::calculate_portfolio_summary(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[napi]
pub fn filter_transactions(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: loan_desk_core::listing::page::TransactionListInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = loan_desk_core::listing::page::list_transactions(&input, policy.page_size)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn filter_loans(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: loan_desk_core::listing::page::LoanListInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = loan_desk_core::listing::page::list_loans(&input, policy.page_size)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

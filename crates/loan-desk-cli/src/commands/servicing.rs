use chrono::NaiveDateTime;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use loan_desk_core::servicing::loan::{self, Loan, LoanStatus, ReviewDecision};
use loan_desk_core::servicing::progress::{self, LoanProgressInput, ProgressInput, ProgressSource};
use loan_desk_core::servicing::session::Session;
use loan_desk_core::servicing::summary::{self, PortfolioInput};
use loan_desk_core::servicing::transaction::{self, Transaction, TransactionStatus};

use super::parse_enum;
use crate::input;

#[derive(Args)]
pub struct ProgressArgs {
    /// Path to JSON input file: {loan, transactions} or {principal, source}
    #[arg(long)]
    pub input: Option<String>,

    /// Original principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Outstanding balance as stored on the loan
    #[arg(long)]
    pub remaining_balance: Option<Decimal>,
}

#[derive(Args)]
pub struct ReviewArgs {
    /// Path to JSON input file: {session, loan, decision?, at?}
    #[arg(long)]
    pub input: Option<String>,

    /// APPROVED or REJECTED (overrides the input)
    #[arg(long)]
    pub decision: Option<String>,

    /// Decision timestamp (YYYY-MM-DDTHH:MM:SS); defaults to now
    #[arg(long)]
    pub at: Option<NaiveDateTime>,
}

#[derive(Args)]
pub struct AdvanceArgs {
    /// Path to the loan JSON
    #[arg(long)]
    pub input: Option<String>,

    /// Target status: APPROVED, ACTIVE, PAID_OFF, REJECTED
    #[arg(long)]
    pub to: String,

    /// Timestamp of the change; defaults to now
    #[arg(long)]
    pub at: Option<NaiveDateTime>,
}

#[derive(Args)]
pub struct SettleArgs {
    /// Path to the transaction JSON
    #[arg(long)]
    pub input: Option<String>,

    /// COMPLETED or FAILED
    #[arg(long)]
    pub to: String,
}

#[derive(Args)]
pub struct SummaryArgs {
    /// Path to JSON input file: {loans, transactions?}
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct ReviewRequest {
    session: Session,
    loan: Loan,
    #[serde(default)]
    decision: Option<ReviewDecision>,
    #[serde(default)]
    at: Option<NaiveDateTime>,
}

pub fn run_progress(args: ProgressArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(data) = input::stdin::read_input(args.input.as_deref())? {
        if data.get("loan").is_some() {
            let loan_input: LoanProgressInput = serde_json::from_value(data)?;
            let result = progress::calculate_loan_progress(&loan_input)?;
            return Ok(serde_json::to_value(result)?);
        }
        let progress_input: ProgressInput = serde_json::from_value(data)?;
        let result = progress::calculate_progress(&progress_input)?;
        return Ok(serde_json::to_value(result)?);
    }

    let progress_input = ProgressInput {
        principal: args
            .principal
            .ok_or("--principal is required (or provide --input)")?,
        source: ProgressSource::RemainingBalance(
            args.remaining_balance
                .ok_or("--remaining-balance is required (or provide --input)")?,
        ),
    };
    let result = progress::calculate_progress(&progress_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_review(args: ReviewArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::stdin::read_input(args.input.as_deref())?
        .ok_or("--input is required: {session, loan, decision}")?;
    let request: ReviewRequest = serde_json::from_value(data)?;

    let decision = match args.decision.as_deref() {
        Some(raw) => parse_enum::<ReviewDecision>("decision", raw)?,
        None => request
            .decision
            .ok_or("--decision is required (or set \"decision\" in the input)")?,
    };
    let at = args.at.or(request.at).unwrap_or_else(now);

    let reviewed = loan::review_loan(&request.session, &request.loan, decision, at)?;
    Ok(serde_json::to_value(reviewed)?)
}

pub fn run_advance(args: AdvanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::stdin::read_input(args.input.as_deref())?
        .ok_or("--input is required: the loan to advance")?;
    let current: Loan = serde_json::from_value(data)?;
    let to: LoanStatus = parse_enum("to", &args.to)?;

    let advanced = loan::transition_loan(&current, to, args.at.unwrap_or_else(now))?;
    Ok(serde_json::to_value(advanced)?)
}

pub fn run_settle(args: SettleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::stdin::read_input(args.input.as_deref())?
        .ok_or("--input is required: the transaction to settle")?;
    let current: Transaction = serde_json::from_value(data)?;
    let to: TransactionStatus = parse_enum("to", &args.to)?;

    let settled = transaction::transition_transaction(&current, to)?;
    Ok(serde_json::to_value(settled)?)
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::stdin::read_input(args.input.as_deref())?
        .ok_or("--input is required: {loans, transactions}")?;
    let portfolio: PortfolioInput = serde_json::from_value(data)?;

    let result = summary::calculate_portfolio_summary(&portfolio)?;
    Ok(serde_json::to_value(result)?)
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

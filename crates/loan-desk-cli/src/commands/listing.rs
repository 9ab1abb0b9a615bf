use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use loan_desk_core::listing::page::{self, LoanListInput, TransactionListInput};
use loan_desk_core::LendingPolicy;

use super::parse_enum;
use crate::input;

#[derive(Args)]
pub struct TransactionsArgs {
    /// Path to JSON input file: {transactions, filter?, page?, session?}
    #[arg(long)]
    pub input: Option<String>,

    /// DISBURSEMENT or REPAYMENT
    #[arg(long = "type")]
    pub transaction_type: Option<String>,

    /// Search description and reference
    #[arg(long)]
    pub query: Option<String>,

    /// Start of the date range (needs --to)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// End of the date range (needs --from)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long)]
    pub page: Option<usize>,

    #[arg(long)]
    pub per_page: Option<usize>,
}

#[derive(Args)]
pub struct LoansArgs {
    /// Path to JSON input file: {loans, filter?, page?, session?}
    #[arg(long)]
    pub input: Option<String>,

    /// PENDING, APPROVED, ACTIVE, PAID_OFF or REJECTED
    #[arg(long)]
    pub status: Option<String>,

    /// Search purpose or loan id
    #[arg(long)]
    pub query: Option<String>,

    #[arg(long)]
    pub page: Option<usize>,

    #[arg(long)]
    pub per_page: Option<usize>,
}

pub fn run_transactions(
    args: TransactionsArgs,
    policy: &LendingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::stdin::read_input(args.input.as_deref())?
        .ok_or("--input is required: {transactions, filter?}")?;
    let mut list: TransactionListInput = serde_json::from_value(data)?;

    if let Some(raw) = args.transaction_type.as_deref() {
        list.filter.transaction_type = Some(parse_enum("type", raw)?);
    }
    if args.query.is_some() {
        list.filter.query = args.query;
    }
    if args.from.is_some() {
        list.filter.start_date = args.from;
    }
    if args.to.is_some() {
        list.filter.end_date = args.to;
    }
    if let Some(p) = args.page {
        list.page = p;
    }
    if args.per_page.is_some() {
        list.per_page = args.per_page;
    }

    let result = page::list_transactions(&list, policy.page_size)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_loans(args: LoansArgs, policy: &LendingPolicy) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::stdin::read_input(args.input.as_deref())?
        .ok_or("--input is required: {loans, filter?}")?;
    let mut list: LoanListInput = serde_json::from_value(data)?;

    if let Some(raw) = args.status.as_deref() {
        list.filter.status = Some(parse_enum("status", raw)?);
    }
    if args.query.is_some() {
        list.filter.query = args.query;
    }
    if let Some(p) = args.page {
        list.page = p;
    }
    if args.per_page.is_some() {
        list.per_page = args.per_page;
    }

    let result = page::list_loans(&list, policy.page_size)?;
    Ok(serde_json::to_value(result)?)
}

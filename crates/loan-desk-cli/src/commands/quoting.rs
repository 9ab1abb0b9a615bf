use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_desk_core::quoting::quote::{self, LoanQuoteRequest};
use loan_desk_core::quoting::rate::{self, RateQuoteInput};
use loan_desk_core::{LendingPolicy, LoanPurpose, Tenure};

use super::default_key;
use crate::input;

/// Arguments for a rate card lookup
#[derive(Args)]
pub struct RateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Requested amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Tenure in months
    #[arg(long)]
    pub tenure: Option<u32>,
}

/// Arguments for a full application quote
#[derive(Args)]
pub struct QuoteArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Requested principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Tenure in months (6, 12, 24 or 36)
    #[arg(long)]
    pub tenure: Option<u32>,

    /// business, education, medical, personal, or free text
    #[arg(long, default_value = "personal")]
    pub purpose: String,

    /// Application date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Stated monthly income, for the affordability ratio
    #[arg(long, alias = "income")]
    pub monthly_income: Option<Decimal>,
}

pub fn run_rate(args: RateArgs, policy: &LendingPolicy) -> Result<Value, Box<dyn std::error::Error>> {
    let rate_input: RateQuoteInput = if let Some(mut data) = input::stdin::read_input(args.input.as_deref())? {
        default_key(&mut data, "policy", serde_json::to_value(&policy.rate)?);
        serde_json::from_value(data)?
    } else {
        RateQuoteInput {
            amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            tenure_months: args.tenure.ok_or("--tenure is required (or provide --input)")?,
            policy: policy.rate.clone(),
        }
    };

    let result = rate::calculate_rate_quote(&rate_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_quote(args: QuoteArgs, policy: &LendingPolicy) -> Result<Value, Box<dyn std::error::Error>> {
    let request: LoanQuoteRequest = if let Some(data) = input::stdin::read_input(args.input.as_deref())? {
        serde_json::from_value(data)?
    } else {
        let months = args.tenure.ok_or("--tenure is required (or provide --input)")?;
        LoanQuoteRequest {
            principal: args.principal.ok_or("--principal is required (or provide --input)")?,
            tenure: Tenure::try_from(months)?,
            purpose: LoanPurpose::from(args.purpose),
            application_date: args
                .date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            monthly_income: args.monthly_income,
        }
    };

    let result = quote::quote_loan(&request, policy)?;
    Ok(serde_json::to_value(result)?)
}

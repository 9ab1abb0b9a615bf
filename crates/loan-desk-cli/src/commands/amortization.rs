use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_desk_core::amortization::schedule::{self, ScheduleEntry, ScheduleInput};
use loan_desk_core::amortization::terms::{self, TermsInput};
use loan_desk_core::quoting::rate;
use loan_desk_core::{InterestMethod, LendingPolicy};

use super::default_key;
use crate::input;

/// Arguments shared by terms and schedule
#[derive(Args)]
pub struct LoanShapeArgs {
    /// Principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Tenure in months
    #[arg(long)]
    pub tenure: Option<u32>,

    /// Annual rate in percent; quoted from the rate card when omitted
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// flat or amortizing; defaults to the policy's method
    #[arg(long)]
    pub method: Option<String>,
}

#[derive(Args)]
pub struct TermsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub shape: LoanShapeArgs,
}

#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub shape: LoanShapeArgs,

    /// Application date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Total repaid so far; marks installments PAID / OVERDUE
    #[arg(long)]
    pub repaid: Option<Decimal>,

    /// Day the statuses are evaluated on; defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_terms(args: TermsArgs, policy: &LendingPolicy) -> Result<Value, Box<dyn std::error::Error>> {
    let terms_input: TermsInput = if let Some(mut data) = input::stdin::read_input(args.input.as_deref())? {
        default_key(&mut data, "method", serde_json::to_value(policy.interest_method)?);
        serde_json::from_value(data)?
    } else {
        let (principal, tenure_months, annual_rate, method) = resolve_shape(&args.shape, policy)?;
        TermsInput {
            principal,
            tenure_months,
            annual_rate,
            method,
        }
    };

    let result = terms::calculate_terms(&terms_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs, policy: &LendingPolicy) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = if let Some(mut data) = input::stdin::read_input(args.input.as_deref())? {
        default_key(&mut data, "method", serde_json::to_value(policy.interest_method)?);
        serde_json::from_value(data)?
    } else {
        let (principal, tenure_months, annual_rate, method) = resolve_shape(&args.shape, policy)?;
        ScheduleInput {
            principal,
            tenure_months,
            annual_rate,
            start_date: args.start_date.unwrap_or_else(today),
            method,
        }
    };

    let result = schedule::calculate_schedule(&schedule_input)?;

    match args.repaid {
        Some(repaid) => {
            let entries: &[ScheduleEntry] = &result.result.entries;
            let view = schedule::refresh_schedule_status(entries, repaid, args.as_of.unwrap_or_else(today))?;
            Ok(serde_json::to_value(view)?)
        }
        None => Ok(serde_json::to_value(result)?),
    }
}

fn resolve_shape(
    shape: &LoanShapeArgs,
    policy: &LendingPolicy,
) -> Result<(Decimal, u32, Decimal, InterestMethod), Box<dyn std::error::Error>> {
    let principal = shape
        .principal
        .ok_or("--principal is required (or provide --input)")?;
    let tenure = shape
        .tenure
        .ok_or("--tenure is required (or provide --input)")?;
    let annual_rate = shape
        .rate
        .unwrap_or_else(|| rate::price_rate(principal, tenure, &policy.rate).rate);
    let method = match shape.method.as_deref() {
        Some(raw) => serde_json::from_value(Value::String(raw.trim().to_lowercase()))
            .map_err(|_| format!("--method: expected flat or amortizing, got '{raw}'"))?,
        None => policy.interest_method,
    };
    Ok((principal, tenure, annual_rate, method))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

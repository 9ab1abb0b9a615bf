use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::loan::{Loan, LoanStatus};
use super::transaction::{Transaction, TransactionStatus};
use crate::types::*;
use crate::LoanDeskResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioInput {
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Headline figures for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_loans: usize,
    pub pending: usize,
    pub approved: usize,
    pub active: usize,
    pub paid_off: usize,
    pub rejected: usize,
    /// Sum of every application's principal
    pub total_requested: Money,
    /// Principal of loans that made it past review
    pub total_approved: Money,
    pub total_disbursed: Money,
    pub total_repaid: Money,
    pub pending_transactions: usize,
}

pub fn portfolio_summary(loans: &[Loan], transactions: &[Transaction]) -> PortfolioSummary {
    let mut s = PortfolioSummary {
        total_loans: loans.len(),
        ..Default::default()
    };

    for loan in loans {
        match loan.status {
            LoanStatus::Pending => s.pending += 1,
            LoanStatus::Approved => s.approved += 1,
            LoanStatus::Active => s.active += 1,
            LoanStatus::PaidOff => s.paid_off += 1,
            LoanStatus::Rejected => s.rejected += 1,
        }
        s.total_requested += loan.amount;
        if matches!(
            loan.status,
            LoanStatus::Approved | LoanStatus::Active | LoanStatus::PaidOff
        ) {
            s.total_approved += loan.amount;
        }
    }

    for tx in transactions {
        if tx.is_completed_disbursement() {
            s.total_disbursed += tx.amount;
        } else if tx.is_completed_repayment() {
            s.total_repaid += tx.amount;
        } else if tx.status == TransactionStatus::Pending {
            s.pending_transactions += 1;
        }
    }

    s
}

pub fn calculate_portfolio_summary(
    input: &PortfolioInput,
) -> LoanDeskResult<ComputationOutput<PortfolioSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let summary = portfolio_summary(&input.loans, &input.transactions);

    let orphaned = input
        .transactions
        .iter()
        .filter(|t| !input.loans.iter().any(|l| l.id == t.loan_id))
        .count();
    if orphaned > 0 {
        warnings.push(format!("{orphaned} transaction(s) reference loans not in the input."));
    }
    if summary.total_disbursed > summary.total_approved && summary.total_approved > Decimal::ZERO {
        warnings.push("Disbursed funds exceed approved principal.".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio summary: status counts and completed cash movements",
        &serde_json::json!({ "counts_transactions": "COMPLETED only for totals" }),
        warnings,
        elapsed,
        summary,
    ))
}

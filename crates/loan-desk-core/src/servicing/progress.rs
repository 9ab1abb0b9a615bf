use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::loan::Loan;
use super::transaction::Transaction;
use crate::types::*;
use crate::{LoanDeskError, LoanDeskResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Where paid-to-date comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressSource {
    /// Stored outstanding balance: paid = principal - balance
    RemainingBalance(Money),
    /// Sum of COMPLETED REPAYMENT transactions
    Transactions(Vec<Transaction>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInput {
    pub principal: Money,
    pub source: ProgressSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProgress {
    pub principal: Money,
    pub total_paid: Money,
    /// principal - total_paid, floored at zero
    pub remaining_balance: Money,
    /// Whole percent in [0, 100]
    pub percent_complete: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProgressInput {
    pub loan: Loan,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProgressOutput {
    pub loan_id: u64,
    pub progress: LoanProgress,
    pub repayments_counted: usize,
    /// Balance the API stored on the loan, when it differs from the derived one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_remaining_balance: Option<Money>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn compute_progress(principal: Money, source: &ProgressSource) -> LoanDeskResult<LoanProgress> {
    if principal < Decimal::ZERO {
        return Err(LoanDeskError::InvalidInput {
            field: "principal".into(),
            reason: "Principal cannot be negative.".into(),
        });
    }

    let total_paid = match source {
        ProgressSource::RemainingBalance(balance) => {
            if *balance < Decimal::ZERO {
                return Err(LoanDeskError::InvalidInput {
                    field: "remaining_balance".into(),
                    reason: "Remaining balance cannot be negative.".into(),
                });
            }
            (principal - balance).max(Decimal::ZERO)
        }
        ProgressSource::Transactions(txs) => sum_repayments(txs)?,
    };

    Ok(progress_from_paid(principal, total_paid))
}

/// Progress of one loan from its own completed repayments.
///
/// Transactions belonging to other loans are ignored. The stored
/// `remainingBalance` is never used as an input.
pub fn loan_progress(loan: &Loan, transactions: &[Transaction]) -> LoanDeskResult<LoanProgress> {
    let own: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.loan_id == loan.id)
        .cloned()
        .collect();
    compute_progress(loan.amount, &ProgressSource::Transactions(own))
}

pub fn calculate_progress(input: &ProgressInput) -> LoanDeskResult<ComputationOutput<LoanProgress>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let progress = compute_progress(input.principal, &input.source)?;

    if input.principal.is_zero() {
        warnings.push("Principal is zero; progress reported as 0%.".into());
    }
    if progress.total_paid > input.principal && !input.principal.is_zero() {
        warnings.push(format!(
            "Paid {} exceeds principal {}; progress capped at 100%.",
            progress.total_paid, input.principal
        ));
    }

    let source = match input.source {
        ProgressSource::RemainingBalance(_) => "remaining_balance",
        ProgressSource::Transactions(_) => "transactions",
    };
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Repayment progress: round(100 x paid / principal), clamped to [0, 100]",
        &serde_json::json!({ "source": source }),
        warnings,
        elapsed,
        progress,
    ))
}

pub fn calculate_loan_progress(
    input: &LoanProgressInput,
) -> LoanDeskResult<ComputationOutput<LoanProgressOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let progress = loan_progress(&input.loan, &input.transactions)?;
    let repayments_counted = input
        .transactions
        .iter()
        .filter(|t| t.loan_id == input.loan.id && t.is_completed_repayment())
        .count();

    let stored_remaining_balance = input
        .loan
        .remaining_balance
        .filter(|stored| *stored != progress.remaining_balance);
    if let Some(stored) = stored_remaining_balance {
        warn!(
            loan_id = input.loan.id,
            %stored,
            derived = %progress.remaining_balance,
            "stored remaining balance disagrees with repayments"
        );
        warnings.push(format!(
            "Stored remaining balance {} differs from the {} derived from completed repayments.",
            stored, progress.remaining_balance
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Repayment progress from completed REPAYMENT transactions",
        &serde_json::json!({ "source": "transactions", "loan_id": input.loan.id }),
        warnings,
        elapsed,
        LoanProgressOutput {
            loan_id: input.loan.id,
            progress,
            repayments_counted,
            stored_remaining_balance,
        },
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn sum_repayments(txs: &[Transaction]) -> LoanDeskResult<Money> {
    let mut total = Decimal::ZERO;
    for tx in txs.iter().filter(|t| t.is_completed_repayment()) {
        if tx.amount < Decimal::ZERO {
            return Err(LoanDeskError::InvalidInput {
                field: format!("transactions[{}].amount", tx.id),
                reason: "Repayment amount cannot be negative.".into(),
            });
        }
        total += tx.amount;
    }
    Ok(total)
}

fn progress_from_paid(principal: Money, total_paid: Money) -> LoanProgress {
    let percent_complete = if principal.is_zero() {
        0
    } else {
        (dec!(100) * total_paid / principal)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .clamp(Decimal::ZERO, dec!(100))
            .to_u8()
            .unwrap_or(0)
    };

    let progress = LoanProgress {
        principal,
        total_paid,
        remaining_balance: (principal - total_paid).max(Decimal::ZERO),
        percent_complete,
    };
    debug!(%principal, %total_paid, percent = percent_complete, "repayment progress computed");
    progress
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servicing::transaction::{TransactionStatus, TransactionType};
    use chrono::NaiveDate;

    fn tx(id: u64, loan_id: u64, kind: TransactionType, amount: Money, status: TransactionStatus) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            loan_id,
            transaction_type: kind,
            amount,
            transaction_date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            status,
            description: None,
            reference: None,
        }
    }

    #[test]
    fn test_from_remaining_balance() {
        let p = compute_progress(dec!(50000), &ProgressSource::RemainingBalance(dec!(45000))).unwrap();
        assert_eq!(p.total_paid, dec!(5000));
        assert_eq!(p.remaining_balance, dec!(45000));
        assert_eq!(p.percent_complete, 10);
    }

    #[test]
    fn test_zero_principal() {
        let p = compute_progress(Decimal::ZERO, &ProgressSource::RemainingBalance(Decimal::ZERO)).unwrap();
        assert_eq!(p.percent_complete, 0);
        let p = compute_progress(Decimal::ZERO, &ProgressSource::Transactions(vec![])).unwrap();
        assert_eq!(p.percent_complete, 0);
    }

    #[test]
    fn test_only_completed_repayments_count() {
        use TransactionStatus::*;
        use TransactionType::*;
        let txs = vec![
            tx(1, 1, Disbursement, dec!(50000), Completed),
            tx(2, 1, Repayment, dec!(4500), Completed),
            tx(3, 1, Repayment, dec!(4500), Pending),
            tx(4, 1, Repayment, dec!(4500), Failed),
            tx(5, 1, Repayment, dec!(4500), Completed),
        ];
        let p = compute_progress(dec!(50000), &ProgressSource::Transactions(txs)).unwrap();
        assert_eq!(p.total_paid, dec!(9000));
        assert_eq!(p.remaining_balance, dec!(41000));
        // 18%
        assert_eq!(p.percent_complete, 18);
    }

    #[test]
    fn test_overpayment_clamped() {
        let p = compute_progress(dec!(1000), &ProgressSource::Transactions(vec![tx(
            1,
            1,
            TransactionType::Repayment,
            dec!(1150),
            TransactionStatus::Completed,
        )]))
        .unwrap();
        assert_eq!(p.percent_complete, 100);
        assert_eq!(p.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_balance_above_principal_floors_paid() {
        let p = compute_progress(dec!(1000), &ProgressSource::RemainingBalance(dec!(1200))).unwrap();
        assert_eq!(p.total_paid, Decimal::ZERO);
        assert_eq!(p.percent_complete, 0);
    }

    #[test]
    fn test_half_rounds_up() {
        // 0.5% -> 1%
        let p = compute_progress(dec!(1000), &ProgressSource::RemainingBalance(dec!(995))).unwrap();
        assert_eq!(p.percent_complete, 1);
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert!(compute_progress(dec!(-1), &ProgressSource::RemainingBalance(Decimal::ZERO)).is_err());
        assert!(compute_progress(dec!(100), &ProgressSource::RemainingBalance(dec!(-1))).is_err());
    }

    #[test]
    fn test_envelope_source_label() {
        let out = calculate_progress(&ProgressInput {
            principal: dec!(50000),
            source: ProgressSource::RemainingBalance(dec!(45000)),
        })
        .unwrap();
        assert_eq!(out.assumptions["source"], "remaining_balance");
        assert_eq!(out.result.percent_complete, 10);
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::*;
use crate::{LoanDeskError, LoanDeskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Funds paid out to the borrower
    Disbursement,
    /// Borrower payment toward the balance
    Repayment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: u64,
    pub user_id: u64,
    pub loan_id: u64,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub transaction_date: NaiveDate,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Transaction {
    /// Settled money toward the balance.
    pub fn is_completed_repayment(&self) -> bool {
        self.transaction_type == TransactionType::Repayment
            && self.status == TransactionStatus::Completed
    }

    pub fn is_completed_disbursement(&self) -> bool {
        self.transaction_type == TransactionType::Disbursement
            && self.status == TransactionStatus::Completed
    }
}

/// Settle a pending transaction. COMPLETED and FAILED are final.
pub fn transition_transaction(tx: &Transaction, to: TransactionStatus) -> LoanDeskResult<Transaction> {
    if tx.status != TransactionStatus::Pending || to == TransactionStatus::Pending {
        return Err(LoanDeskError::InvalidTransition {
            from: tx.status.to_string(),
            to: to.to_string(),
        });
    }
    if tx.amount <= Decimal::ZERO {
        return Err(LoanDeskError::InvalidInput {
            field: "amount".into(),
            reason: "Transaction amount must be positive.".into(),
        });
    }

    info!(transaction_id = tx.id, loan_id = tx.loan_id, status = %to, "transaction settled");
    Ok(Transaction {
        status: to,
        ..tx.clone()
    })
}

use serde::{Deserialize, Serialize};

use super::loan::Loan;
use super::transaction::Transaction;
use crate::{LoanDeskError, LoanDeskResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    #[serde(alias = "user")]
    User,
    #[serde(alias = "admin")]
    Admin,
}

/// Who is asking. Passed explicitly to every operation that depends on the
/// caller; there is no process-wide current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: u64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Session {
    pub fn new(user_id: u64, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            email: email.into(),
            name: None,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self, action: &str) -> LoanDeskResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(LoanDeskError::Unauthorized(format!(
                "user {} may not {action}",
                self.user_id
            )))
        }
    }

    pub fn can_view_loan(&self, loan: &Loan) -> bool {
        self.is_admin() || loan.user_id == self.user_id
    }

    pub fn can_view_transaction(&self, tx: &Transaction) -> bool {
        self.is_admin() || tx.user_id == self.user_id
    }
}

/// Loans the session may see: all of them for admins, their own otherwise.
pub fn visible_loans<'a>(session: &Session, loans: &'a [Loan]) -> Vec<&'a Loan> {
    loans.iter().filter(|l| session.can_view_loan(l)).collect()
}

pub fn visible_transactions<'a>(session: &Session, txs: &'a [Transaction]) -> Vec<&'a Transaction> {
    txs.iter().filter(|t| session.can_view_transaction(t)).collect()
}

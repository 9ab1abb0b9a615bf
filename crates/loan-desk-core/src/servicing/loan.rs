use chrono::{Months as CalendarMonths, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::session::Session;
use crate::types::*;
use crate::{LoanDeskError, LoanDeskResult};

/// Lifecycle of a loan application.
///
/// PENDING -> APPROVED -> ACTIVE -> PAID_OFF, or PENDING -> REJECTED.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    #[default]
    Pending,
    Approved,
    Active,
    PaidOff,
    Rejected,
}

impl LoanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::PaidOff | Self::Rejected)
    }

    pub fn can_transition_to(self, to: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (self, to),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Active)
                | (Approved, PaidOff)
                | (Active, PaidOff)
        )
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Active => "ACTIVE",
            Self::PaidOff => "PAID_OFF",
            Self::Rejected => "REJECTED",
        };
        write!(f, "{}", s)
    }
}

/// A loan as the lending API returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: u64,
    pub user_id: u64,
    pub amount: Money,
    /// Months
    pub tenure: Months,
    /// Annual rate in percent
    pub interest_rate: Percent,
    #[serde(default)]
    pub status: LoanStatus,
    pub applied_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repaid_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_payment_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_balance: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Outcome an admin records against a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for LoanStatus {
    fn from(d: ReviewDecision) -> Self {
        match d {
            ReviewDecision::Approved => LoanStatus::Approved,
            ReviewDecision::Rejected => LoanStatus::Rejected,
        }
    }
}

/// Move `loan` to `to`, stamping the lifecycle timestamps.
///
/// Only the status machine is enforced; whether the move should happen is
/// the caller's decision.
pub fn transition_loan(loan: &Loan, to: LoanStatus, at: NaiveDateTime) -> LoanDeskResult<Loan> {
    if !loan.status.can_transition_to(to) {
        return Err(LoanDeskError::InvalidTransition {
            from: loan.status.to_string(),
            to: to.to_string(),
        });
    }

    let mut next = loan.clone();
    next.status = to;
    next.updated_at = Some(at);

    match to {
        LoanStatus::Approved => {
            next.approved_at = Some(at);
            if next.remaining_balance.is_none() {
                next.remaining_balance = Some(loan.amount);
            }
        }
        LoanStatus::Active => {
            if next.next_payment_date.is_none() {
                next.next_payment_date = at.checked_add_months(CalendarMonths::new(1));
            }
        }
        LoanStatus::PaidOff => {
            next.repaid_at = Some(at);
            next.remaining_balance = Some(Money::ZERO);
            next.next_payment_date = None;
        }
        LoanStatus::Pending | LoanStatus::Rejected => {}
    }

    info!(loan_id = loan.id, from = %loan.status, to = %to, "loan status changed");
    Ok(next)
}

/// Record an admin's decision on a pending application.
pub fn review_loan(
    session: &Session,
    loan: &Loan,
    decision: ReviewDecision,
    at: NaiveDateTime,
) -> LoanDeskResult<Loan> {
    session.require_admin("review loan applications")?;
    if loan.status != LoanStatus::Pending {
        return Err(LoanDeskError::InvalidTransition {
            from: loan.status.to_string(),
            to: LoanStatus::from(decision).to_string(),
        });
    }
    transition_loan(loan, decision.into(), at)
}

use chrono::{Months as CalendarMonths, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::terms::{self, LoanTerms};
use crate::types::*;
use crate::{LoanDeskError, LoanDeskResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
}

impl std::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 1-based month index
    pub month: Months,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub interest: Money,
    pub principal: Money,
    /// Principal outstanding once this installment is paid
    pub balance_after: Money,
    pub status: InstallmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub principal: Money,
    pub tenure_months: Months,
    pub annual_rate: Percent,
    /// Application date; installment k falls due k months after it
    pub start_date: NaiveDate,
    #[serde(default)]
    pub method: InterestMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub terms: LoanTerms,
    pub entries: Vec<ScheduleEntry>,
    pub total_scheduled: Money,
}

/// Schedule statuses as of a given day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleStatusView {
    pub as_of: NaiveDate,
    pub entries: Vec<ScheduleEntry>,
    pub paid_count: usize,
    pub overdue_count: usize,
    pub overdue_amount: Money,
    /// Repayments beyond the last fully covered installment
    pub partial_credit: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<ScheduleEntry>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay the installments of `terms` out on the calendar.
///
/// Month arithmetic clamps to the end of shorter months (31 Jan + 1 month =
/// 28/29 Feb). Every entry starts PENDING.
pub fn build_schedule(terms: &LoanTerms, start_date: NaiveDate) -> LoanDeskResult<Vec<ScheduleEntry>> {
    let installments = terms::installments(terms)?;

    installments
        .into_iter()
        .zip(1..)
        .map(|(inst, month)| -> LoanDeskResult<ScheduleEntry> {
            Ok(ScheduleEntry {
                month,
                due_date: add_months(start_date, month)?,
                amount: inst.amount,
                interest: inst.interest,
                principal: inst.principal,
                balance_after: inst.balance_after,
                status: InstallmentStatus::Pending,
            })
        })
        .collect()
}

/// Terms plus dated schedule, wrapped in the standard output envelope.
pub fn calculate_schedule(
    input: &ScheduleInput,
) -> LoanDeskResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = terms::compute_terms_with_method(
        input.principal,
        input.tenure_months,
        input.annual_rate,
        input.method,
    )?;
    let entries = build_schedule(&terms, input.start_date)?;
    let total_scheduled: Money = entries.iter().map(|e| e.amount).sum();

    if let Some(last) = entries.last() {
        if last.amount != terms.monthly_payment {
            warnings.push(format!(
                "Final installment is {} (regular {}) after absorbing rounding.",
                last.amount, terms.monthly_payment
            ));
        }
    }

    debug!(entries = entries.len(), %total_scheduled, "repayment schedule built");

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "method": input.method,
        "start_date": input.start_date,
        "due_date_rule": "start date + month index, clamped to month end",
    });

    Ok(with_metadata(
        terms::methodology(input.method),
        &assumptions,
        warnings,
        elapsed,
        ScheduleOutput {
            terms,
            entries,
            total_scheduled,
        },
    ))
}

/// Mark installments PAID in due order while `total_repaid` covers them in
/// full; unpaid installments due before `as_of` become OVERDUE, the rest
/// stay PENDING.
pub fn refresh_schedule_status(
    entries: &[ScheduleEntry],
    total_repaid: Money,
    as_of: NaiveDate,
) -> LoanDeskResult<ScheduleStatusView> {
    if total_repaid < Decimal::ZERO {
        return Err(LoanDeskError::InvalidInput {
            field: "total_repaid".into(),
            reason: "Repaid amount cannot be negative.".into(),
        });
    }

    let mut ordered = entries.to_vec();
    ordered.sort_by_key(|e| e.month);

    let mut credit = total_repaid;
    let mut paid_count = 0;
    let mut overdue_count = 0;
    let mut overdue_amount = Decimal::ZERO;
    let mut covering = true;

    for entry in ordered.iter_mut() {
        if covering && credit >= entry.amount {
            credit -= entry.amount;
            entry.status = InstallmentStatus::Paid;
            paid_count += 1;
            continue;
        }
        covering = false;
        if entry.due_date < as_of {
            entry.status = InstallmentStatus::Overdue;
            overdue_count += 1;
            overdue_amount += entry.amount;
        } else {
            entry.status = InstallmentStatus::Pending;
        }
    }

    let next_due = ordered
        .iter()
        .find(|e| e.status != InstallmentStatus::Paid)
        .cloned();

    Ok(ScheduleStatusView {
        as_of,
        entries: ordered,
        paid_count,
        overdue_count,
        overdue_amount,
        partial_credit: credit,
        next_due,
    })
}

pub(crate) fn add_months(date: NaiveDate, months: Months) -> LoanDeskResult<NaiveDate> {
    date.checked_add_months(CalendarMonths::new(months))
        .ok_or_else(|| LoanDeskError::DateError(format!("{date} + {months} months is out of range")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::terms::compute_terms;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn reference_schedule() -> Vec<ScheduleEntry> {
        let t = compute_terms(dec!(50000), 12, dec!(15)).unwrap();
        build_schedule(&t, d(2024, 3, 15)).unwrap()
    }

    #[test]
    fn test_schedule_count_and_sum() {
        let s = reference_schedule();
        assert_eq!(s.len(), 12);
        let total: Money = s.iter().map(|e| e.amount).sum();
        assert_eq!(total, dec!(57500));
        assert!(s.iter().all(|e| e.status == InstallmentStatus::Pending));
    }

    #[test]
    fn test_due_dates_step_monthly() {
        let s = reference_schedule();
        assert_eq!(s[0].due_date, d(2024, 4, 15));
        assert_eq!(s[1].due_date, d(2024, 5, 15));
        assert_eq!(s[11].due_date, d(2025, 3, 15));
    }

    #[test]
    fn test_due_dates_clamp_to_month_end() {
        let t = compute_terms(dec!(6000), 6, dec!(15)).unwrap();
        let s = build_schedule(&t, d(2024, 1, 31)).unwrap();
        assert_eq!(s[0].due_date, d(2024, 2, 29));
        assert_eq!(s[2].due_date, d(2024, 4, 30));
    }

    #[test]
    fn test_refresh_marks_paid_then_overdue() {
        let s = reference_schedule();
        // Two full installments plus change
        let view = refresh_schedule_status(&s, dec!(10000), d(2024, 7, 1)).unwrap();
        assert_eq!(view.paid_count, 2);
        assert_eq!(view.entries[0].status, InstallmentStatus::Paid);
        assert_eq!(view.entries[1].status, InstallmentStatus::Paid);
        // June 15 is before July 1 and unpaid
        assert_eq!(view.entries[2].status, InstallmentStatus::Overdue);
        assert_eq!(view.entries[3].status, InstallmentStatus::Pending);
        assert_eq!(view.overdue_count, 1);
        assert_eq!(view.partial_credit, dec!(10000) - dec!(9583.34));
        assert_eq!(view.next_due.unwrap().month, 3);
    }

    #[test]
    fn test_refresh_fully_repaid() {
        let s = reference_schedule();
        let view = refresh_schedule_status(&s, dec!(57500), d(2030, 1, 1)).unwrap();
        assert_eq!(view.paid_count, 12);
        assert!(view.next_due.is_none());
        assert_eq!(view.partial_credit, Decimal::ZERO);
    }

    #[test]
    fn test_refresh_rejects_negative() {
        let s = reference_schedule();
        assert!(refresh_schedule_status(&s, dec!(-1), d(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_calculate_schedule_warns_on_final_adjustment() {
        let input = ScheduleInput {
            principal: dec!(50000),
            tenure_months: 12,
            annual_rate: dec!(15),
            start_date: d(2024, 3, 15),
            method: InterestMethod::Flat,
        };
        let out = calculate_schedule(&input).unwrap();
        assert_eq!(out.result.total_scheduled, out.result.terms.total_payable);
        assert!(out.warnings.iter().any(|w| w.contains("4791.63")));
    }
}

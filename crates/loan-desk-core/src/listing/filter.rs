use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::servicing::loan::{Loan, LoanStatus};
use crate::servicing::transaction::{Transaction, TransactionType};

/// Transaction history filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    /// Case-insensitive substring of description or reference
    pub query: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        let type_ok = self
            .transaction_type
            .map_or(true, |t| t == tx.transaction_type);

        let query_ok = match normalized(&self.query) {
            None => true,
            Some(q) => [&tx.description, &tx.reference]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&q)),
        };

        // A half-open range is ignored; both bounds are inclusive.
        let date_ok = match (self.start_date, self.end_date) {
            (Some(from), Some(to)) => tx.transaction_date >= from && tx.transaction_date <= to,
            _ => true,
        };

        type_ok && query_ok && date_ok
    }

    pub fn apply<'a>(&self, txs: &'a [Transaction]) -> Vec<&'a Transaction> {
        txs.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Admin loan list filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanFilter {
    pub status: Option<LoanStatus>,
    /// Case-insensitive substring of the purpose, or part of the loan id
    pub query: Option<String>,
}

impl LoanFilter {
    pub fn matches(&self, loan: &Loan) -> bool {
        let status_ok = self.status.map_or(true, |s| s == loan.status);
        let query_ok = match normalized(&self.query) {
            None => true,
            Some(q) => {
                loan.id.to_string().contains(&q)
                    || loan
                        .purpose
                        .as_deref()
                        .is_some_and(|p| p.to_lowercase().contains(&q))
            }
        };
        status_ok && query_ok
    }

    pub fn apply<'a>(&self, loans: &'a [Loan]) -> Vec<&'a Loan> {
        loans.iter().filter(|l| self.matches(l)).collect()
    }
}

fn normalized(query: &Option<String>) -> Option<String> {
    query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::filter::{LoanFilter, TransactionFilter};
use crate::servicing::loan::Loan;
use crate::servicing::session::Session;
use crate::servicing::transaction::Transaction;
use crate::types::*;
use crate::{LoanDeskError, LoanDeskResult};

fn first_page() -> usize {
    1
}

/// One page of a filtered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped into range
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    /// 1-based index of the first item shown, 0 when empty
    pub first_item: usize,
    pub last_item: usize,
}

/// Cut `items` into pages of `per_page` and return page `page`.
///
/// Out-of-range pages clamp to the nearest valid one, as the previous/next
/// buttons do.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> LoanDeskResult<Page<T>> {
    if per_page == 0 {
        return Err(LoanDeskError::InvalidInput {
            field: "per_page".into(),
            reason: "Page size must be at least 1.".into(),
        });
    }

    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);
    let slice = items.get(start..end).unwrap_or_default();

    Ok(Page {
        items: slice.to_vec(),
        page,
        per_page,
        total_items,
        total_pages,
        first_item: if slice.is_empty() { 0 } else { start + 1 },
        last_item: end,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionListInput {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub filter: TransactionFilter,
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<usize>,
    /// Restricts the list to what this caller may see
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanListInput {
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub filter: LoanFilter,
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

/// Transaction history view: session scope, then filters, then paging.
pub fn list_transactions(
    input: &TransactionListInput,
    default_page_size: usize,
) -> LoanDeskResult<ComputationOutput<Page<Transaction>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let matched: Vec<Transaction> = input
        .transactions
        .iter()
        .filter(|t| input.session.as_ref().map_or(true, |s| s.can_view_transaction(t)))
        .filter(|t| input.filter.matches(t))
        .cloned()
        .collect();

    let per_page = input.per_page.unwrap_or(default_page_size);
    let page = paginate(&matched, input.page, per_page)?;
    if page.page != input.page {
        warnings.push(format!("Page {} out of range; showing page {}.", input.page, page.page));
    }
    debug!(matched = matched.len(), page = page.page, "transactions listed");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Transaction history: type, text and inclusive date-range filters",
        &input.filter,
        warnings,
        elapsed,
        page,
    ))
}

/// Loan list view: session scope, then filters, then paging.
pub fn list_loans(
    input: &LoanListInput,
    default_page_size: usize,
) -> LoanDeskResult<ComputationOutput<Page<Loan>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let matched: Vec<Loan> = input
        .loans
        .iter()
        .filter(|l| input.session.as_ref().map_or(true, |s| s.can_view_loan(l)))
        .filter(|l| input.filter.matches(l))
        .cloned()
        .collect();

    let per_page = input.per_page.unwrap_or(default_page_size);
    let page = paginate(&matched, input.page, per_page)?;
    if page.page != input.page {
        warnings.push(format!("Page {} out of range; showing page {}.", input.page, page.page));
    }
    debug!(matched = matched.len(), page = page.page, "loans listed");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan list: status and text filters",
        &input.filter,
        warnings,
        elapsed,
        page,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let items: Vec<u32> = (1..=25).collect();
        let p = paginate(&items, 1, 10).unwrap();
        assert_eq!(p.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(p.total_pages, 3);
        assert_eq!((p.first_item, p.last_item), (1, 10));
    }

    #[test]
    fn test_last_partial_page() {
        let items: Vec<u32> = (1..=25).collect();
        let p = paginate(&items, 3, 10).unwrap();
        assert_eq!(p.items, vec![21, 22, 23, 24, 25]);
        assert_eq!((p.first_item, p.last_item), (21, 25));
    }

    #[test]
    fn test_page_clamped() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(&items, 9, 10).unwrap().page, 3);
        assert_eq!(paginate(&items, 0, 10).unwrap().page, 1);
    }

    #[test]
    fn test_empty_list() {
        let items: Vec<u32> = Vec::new();
        let p = paginate(&items, 1, 10).unwrap();
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.page, 1);
        assert!(p.items.is_empty());
        assert_eq!((p.first_item, p.last_item), (0, 0));
    }

    #[test]
    fn test_zero_page_size() {
        assert!(paginate(&[1, 2, 3], 1, 0).is_err());
    }
}

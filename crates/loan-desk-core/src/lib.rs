pub mod error;
pub mod policy;
pub mod types;

#[cfg(feature = "quoting")]
pub mod quoting;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "servicing")]
pub mod servicing;

#[cfg(feature = "listing")]
pub mod listing;

pub use error::LoanDeskError;
pub use policy::{LendingPolicy, RatePolicy};
pub use types::*;

/// Standard result type for all loan-desk operations
pub type LoanDeskResult<T> = Result<T, LoanDeskError>;

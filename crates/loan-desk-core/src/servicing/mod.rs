pub mod loan;
pub mod progress;
pub mod session;
pub mod summary;
pub mod transaction;

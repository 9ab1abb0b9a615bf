pub mod rate;

#[cfg(feature = "amortization")]
pub mod quote;

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::policy::RatePolicy;
use crate::types::*;
use crate::LoanDeskResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateQuoteInput {
    pub amount: Money,
    pub tenure_months: Months,
    #[serde(default)]
    pub policy: RatePolicy,
}

/// One line of the rate build-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateAdjustment {
    pub label: String,
    pub points: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub rate: Percent,
    pub base_rate: Percent,
    pub adjustments: Vec<RateAdjustment>,
    /// Rate before the policy floor/ceiling was applied
    pub unclamped_rate: Percent,
    pub clamped: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Annual rate in percent for the default rate card.
///
/// Total over its domain: any amount and tenure produce a rate.
pub fn quote_rate(amount: Money, tenure_months: Months) -> Percent {
    price_rate(amount, tenure_months, &RatePolicy::default()).rate
}

/// Build the rate up from the policy's base and adjustments.
///
/// The policy's bounds are assumed valid; see [`RatePolicy::validate`].
pub fn price_rate(amount: Money, tenure_months: Months, policy: &RatePolicy) -> RateQuote {
    let mut adjustments = Vec::new();

    if tenure_months > policy.long_tenure_threshold {
        adjustments.push(RateAdjustment {
            label: format!("tenure above {} months", policy.long_tenure_threshold),
            points: policy.long_tenure_premium,
        });
    }
    if amount > policy.large_amount_threshold {
        adjustments.push(RateAdjustment {
            label: format!("amount above {}", policy.large_amount_threshold),
            points: -policy.large_amount_discount,
        });
    }

    let unclamped_rate = round_rate(
        policy.base_rate + adjustments.iter().map(|a| a.points).sum::<Percent>(),
    );
    let rate = unclamped_rate.clamp(policy.min_rate, policy.max_rate);
    let clamped = rate != unclamped_rate;

    if clamped {
        warn!(%unclamped_rate, %rate, "quoted rate clamped to policy bounds");
    }
    debug!(%amount, tenure_months, %rate, "rate quoted");

    RateQuote {
        rate,
        base_rate: policy.base_rate,
        adjustments,
        unclamped_rate,
        clamped,
    }
}

/// Rate quote wrapped in the standard output envelope.
pub fn calculate_rate_quote(
    input: &RateQuoteInput,
) -> LoanDeskResult<ComputationOutput<RateQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.policy.validate()?;
    let quote = price_rate(input.amount, input.tenure_months, &input.policy);
    if quote.clamped {
        warnings.push(format!(
            "Rate {}% clamped to {}% (policy bounds {}% to {}%).",
            quote.unclamped_rate, quote.rate, input.policy.min_rate, input.policy.max_rate
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rate card: base rate plus tenure premium less large-amount discount",
        &input.policy,
        warnings,
        elapsed,
        quote,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

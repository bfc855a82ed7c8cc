// engagement/src/pricing.rs

//! Service-fee rule applied when an accepted proposal becomes an order.

use crate::error::{EngagementError, EngagementResult};
use serde::{Deserialize, Serialize};

const BPS_DENOMINATOR: u128 = 10_000;

/// Platform fee as basis points of the base price. 500 bps is 5 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRule {
  rate_bps: u32,
}

impl Default for FeeRule {
  fn default() -> Self {
    FeeRule { rate_bps: 500 }
  }
}

impl FeeRule {
  pub fn new(rate_bps: u32) -> EngagementResult<Self> {
    if u128::from(rate_bps) > BPS_DENOMINATOR {
      return Err(EngagementError::validation(
        "serviceFeeBps",
        format!("{} exceeds 10000 basis points", rate_bps),
      ));
    }
    Ok(FeeRule { rate_bps })
  }

  pub fn rate_bps(&self) -> u32 {
    self.rate_bps
  }

  /// Fee rounded half-up to a whole unit. Integer-only so equal inputs always give equal fees.
  pub fn service_fee(&self, base_price: u64) -> u64 {
    let scaled = u128::from(base_price) * u128::from(self.rate_bps) + BPS_DENOMINATOR / 2;
    u64::try_from(scaled / BPS_DENOMINATOR).unwrap_or(u64::MAX)
  }

  pub fn compute_total(&self, base_price: u64) -> PriceBreakdown {
    let service_fee = self.service_fee(base_price);
    PriceBreakdown {
      base_price,
      service_fee,
      total: base_price.saturating_add(service_fee),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
  pub base_price: u64,
  pub service_fee: u64,
  pub total: u64,
}

/// `compute_total` under the default 5 % rule.
pub fn compute_total(base_price: u64) -> PriceBreakdown {
  FeeRule::default().compute_total(base_price)
}

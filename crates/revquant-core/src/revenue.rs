//! Output types: per-customer revenue and per-bucket statistics.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::ids::CustomerId;

/// Identity assigned to customers with no entry in the identity table.
pub const UNKNOWN_IDENTITY: &str = "no-email@unknown.com";

/// Decimal places kept when revenue is persisted.
pub const PERSISTED_SCALE: u32 = 2;

/// Revenue per customer, keyed and enumerated by [`CustomerId`].
pub type RevenueMap = BTreeMap<CustomerId, CustomerRevenue>;

/// Accumulated revenue for a single customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRevenue {
  pub customer: CustomerId,
  /// Resolved once, when the customer is first seen.
  pub identity: String,
  /// Unrounded sum of every event contribution.
  pub revenue:  Decimal,
}

impl CustomerRevenue {
  /// Revenue rounded to [`PERSISTED_SCALE`] places, halves away from zero.
  pub fn rounded_revenue(&self) -> Decimal {
    self
      .revenue
      .round_dp_with_strategy(PERSISTED_SCALE, RoundingStrategy::MidpointAwayFromZero)
  }
}

/// Summary of one contiguous rank range of the revenue-sorted population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantileBucket {
  /// 0 is the highest-revenue bucket.
  pub index:          usize,
  pub customer_count: usize,
  pub max_revenue:    Decimal,
  pub min_revenue:    Decimal,
}

impl QuantileBucket {
  /// Upper rank edge of this bucket as a percentage, e.g. `2.5` for the
  /// first bucket at quantile 0.025.
  pub fn upper_percent(&self, quantile: f64) -> f64 {
    (self.index + 1) as f64 * quantile * 100.0
  }

  /// Lower rank edge of this bucket as a percentage.
  pub fn lower_percent(&self, quantile: f64) -> f64 {
    self.index as f64 * quantile * 100.0
  }
}

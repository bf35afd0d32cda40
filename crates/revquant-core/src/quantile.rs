//! The quantile parameter and the ranking order shared by the selector and
//! the stats calculator.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  revenue::{CustomerRevenue, RevenueMap},
};

/// A fraction of the customer population in `(0, 1]`.
///
/// Used both to size the top selection (`0.025` = top 2.5%) and to size the
/// statistics buckets (`floor(1 / q)` buckets).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Quantile(f64);

impl Quantile {
  pub fn new(value: f64) -> Result<Self> {
    // Written so that NaN falls through to the error.
    if value > 0.0 && value <= 1.0 {
      Ok(Self(value))
    } else {
      Err(Error::InvalidQuantile(value))
    }
  }

  pub fn get(self) -> f64 { self.0 }

  /// `floor(n × q)`, forced up to 1 when the population is non-empty.
  pub fn top_count(self, population: usize) -> usize {
    let count = (population as f64 * self.0).floor() as usize;
    if count == 0 && population > 0 { 1 } else { count.min(population) }
  }

  /// `floor(1 / q)`; always at least 1 for a valid quantile.
  pub fn bucket_count(self) -> usize { (1.0 / self.0).floor() as usize }
}

impl TryFrom<f64> for Quantile {
  type Error = Error;

  fn try_from(value: f64) -> Result<Self> { Self::new(value) }
}

impl From<Quantile> for f64 {
  fn from(q: Quantile) -> Self { q.0 }
}

impl fmt::Display for Quantile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:.1}%", self.0 * 100.0)
  }
}

/// Ranking order: revenue descending, then customer id ascending.
///
/// The secondary key makes the order total, so which of several tied
/// customers lands inside a cutoff never depends on map enumeration or sort
/// stability.
pub fn by_rank(a: &CustomerRevenue, b: &CustomerRevenue) -> Ordering {
  b.revenue
    .cmp(&a.revenue)
    .then_with(|| a.customer.cmp(&b.customer))
}

/// Borrow every customer in `revenues`, sorted by [`by_rank`].
pub fn rank(revenues: &RevenueMap) -> Vec<&CustomerRevenue> {
  let mut ranked: Vec<&CustomerRevenue> = revenues.values().collect();
  ranked.sort_unstable_by(|a, b| by_rank(a, b));
  ranked
}

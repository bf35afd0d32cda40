//! Splitting the ranked population into equal-sized quantile buckets.

use crate::{
  Error, Quantile, Result,
  quantile::rank,
  revenue::{QuantileBucket, RevenueMap},
};

/// Per-bucket statistics for `revenues` at the given `quantile`.
///
/// The population is ranked with [`by_rank`](crate::quantile::by_rank) and
/// cut into `floor(1 / quantile)` buckets of `floor(n / buckets)` customers;
/// the last bucket absorbs the remainder. An empty population yields no
/// buckets.
///
/// # Errors
///
/// - [`Error::InvalidQuantile`] if `quantile` is outside `(0, 1]`.
/// - [`Error::InsufficientPopulation`] if there are customers, but fewer
///   than buckets.
pub fn compute_stats(
  revenues: &RevenueMap,
  quantile: f64,
) -> Result<Vec<QuantileBucket>> {
  compute_stats_with(revenues, Quantile::new(quantile)?)
}

/// [`compute_stats`] for an already-validated quantile.
pub fn compute_stats_with(
  revenues: &RevenueMap,
  quantile: Quantile,
) -> Result<Vec<QuantileBucket>> {
  let ranked = rank(revenues);
  let total = ranked.len();
  if total == 0 {
    return Ok(Vec::new());
  }

  let buckets = quantile.bucket_count();
  let bucket_size = total / buckets;
  if bucket_size == 0 {
    return Err(Error::InsufficientPopulation { customers: total, buckets });
  }

  let mut stats = Vec::with_capacity(buckets);
  for index in 0..buckets {
    let start = index * bucket_size;
    if start >= total {
      break;
    }
    let end = if index == buckets - 1 { total } else { start + bucket_size };

    let slice = &ranked[start..end];
    let (Some(first), Some(last)) = (slice.first(), slice.last()) else {
      continue;
    };
    stats.push(QuantileBucket {
      index,
      customer_count: slice.len(),
      max_revenue: first.revenue,
      min_revenue: last.revenue,
    });
  }
  Ok(stats)
}

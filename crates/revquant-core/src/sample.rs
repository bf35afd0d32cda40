//! Random preview of a revenue map, for logging.

use rand::{Rng, seq::SliceRandom as _};

use crate::revenue::{CustomerRevenue, RevenueMap};

/// Up to `count` distinct customers from `revenues`, drawn uniformly with
/// `rng`. Returns the whole population, shuffled, when it is smaller than
/// `count`.
///
/// [`RevenueMap`] enumerates in key order, so a seeded `rng` always yields
/// the same sample for the same map.
pub fn sample<'a, R: Rng + ?Sized>(
  revenues: &'a RevenueMap,
  count: usize,
  rng: &mut R,
) -> Vec<&'a CustomerRevenue> {
  let mut customers: Vec<&CustomerRevenue> = revenues.values().collect();
  let (picked, _) = customers.partial_shuffle(rng, count);
  picked.to_vec()
}

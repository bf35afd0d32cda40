//! Selecting the top fraction of customers by revenue.

use crate::{
  Quantile, Result,
  quantile::rank,
  revenue::RevenueMap,
};

/// The top `quantile` of `revenues`, ranked by [`by_rank`](crate::quantile::by_rank).
///
/// Returns `max(1, floor(n × quantile))` customers for a non-empty input and
/// an empty map for an empty one. Entries are cloned; `revenues` is only
/// borrowed.
///
/// # Errors
///
/// [`Error::InvalidQuantile`](crate::Error::InvalidQuantile) if `quantile` is
/// outside `(0, 1]`.
pub fn select_top(revenues: &RevenueMap, quantile: f64) -> Result<RevenueMap> {
  let quantile = Quantile::new(quantile)?;
  Ok(select_top_with(revenues, quantile))
}

/// [`select_top`] for an already-validated quantile.
pub fn select_top_with(revenues: &RevenueMap, quantile: Quantile) -> RevenueMap {
  let top_count = quantile.top_count(revenues.len());
  rank(revenues)
    .into_iter()
    .take(top_count)
    .map(|c| (c.customer, c.clone()))
    .collect()
}

#[cfg(test)]
mod tests {
  use rust_decimal::Decimal;

  use super::*;
  use crate::{Error, ids::CustomerId, revenue::CustomerRevenue};

  fn population(revenues: impl IntoIterator<Item = (i64, i64)>) -> RevenueMap {
    revenues
      .into_iter()
      .map(|(id, revenue)| {
        let c = CustomerRevenue {
          customer: CustomerId(id),
          identity: format!("{id}@example.com"),
          revenue:  Decimal::from(revenue),
        };
        (c.customer, c)
      })
      .collect()
  }

  #[test]
  fn picks_the_higher_half() {
    let revenues = population([(100, 30), (200, 15)]);
    let top = select_top(&revenues, 0.5).unwrap();
    assert_eq!(top.keys().copied().collect::<Vec<_>>(), vec![CustomerId(100)]);
  }

  #[test]
  fn small_quantile_still_returns_the_maximum() {
    // 37 customers, all with distinct revenues.
    let revenues = population((0..37).map(|i| (i, (i * 7919) % 1000 + 1)));
    let best = revenues.values().max_by_key(|c| c.revenue).unwrap().customer;

    let top = select_top(&revenues, 0.025).unwrap();
    assert_eq!(top.len(), 1);
    assert!(top.contains_key(&best));
  }

  #[test]
  fn empty_population_gives_empty_selection() {
    let revenues = RevenueMap::new();
    for q in [0.01, 0.5, 1.0] {
      assert!(select_top(&revenues, q).unwrap().is_empty());
    }
  }

  #[test]
  fn invalid_quantile_is_an_error() {
    let revenues = population([(1, 10)]);
    for q in [0.0, -1.0, 1.5, f64::NAN] {
      assert!(matches!(
        select_top(&revenues, q),
        Err(Error::InvalidQuantile(_))
      ));
    }
  }

  #[test]
  fn output_size_and_subset_property() {
    let revenues = population((0..250).map(|i| (i, (i * 31) % 97)));
    for q in [0.001, 0.01, 0.025, 0.1, 0.33, 0.5, 0.99, 1.0] {
      let top = select_top(&revenues, q).unwrap();
      let expected = ((revenues.len() as f64 * q).floor() as usize).max(1);
      assert_eq!(top.len(), expected, "q = {q}");
      assert!(top.keys().all(|k| revenues.contains_key(k)));
      assert!(top.iter().all(|(k, v)| revenues[k] == *v));
    }
  }

  #[test]
  fn everything_selected_outranks_everything_left_out() {
    let revenues = population((0..60).map(|i| (i, (i * 17) % 23)));
    let top = select_top(&revenues, 0.2).unwrap();

    let min_in = top.values().map(|c| c.revenue).min().unwrap();
    let max_out = revenues
      .values()
      .filter(|c| !top.contains_key(&c.customer))
      .map(|c| c.revenue)
      .max()
      .unwrap();
    assert!(min_in >= max_out);
  }

  #[test]
  fn ties_at_the_cutoff_resolve_to_lowest_ids() {
    let revenues = population([(40, 10), (10, 10), (30, 10), (20, 10)]);
    let top = select_top(&revenues, 0.5).unwrap();
    assert_eq!(
      top.keys().copied().collect::<Vec<_>>(),
      vec![CustomerId(10), CustomerId(20)]
    );
    // Repeated runs agree.
    assert_eq!(select_top(&revenues, 0.5).unwrap(), top);
  }
}

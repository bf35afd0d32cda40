//! Folding purchase events into per-customer revenue.
//!
//! Revenue is accumulated in [`Decimal`](rust_decimal::Decimal), whose
//! addition is exact, so the totals are identical whatever order the events
//! arrive in and however they are split across workers. Arithmetic is
//! checked: a total that leaves the `Decimal` range is reported as
//! [`Error::RevenueOverflow`] for the customer concerned.

use std::{collections::btree_map::Entry, thread};

use rust_decimal::Decimal;

use crate::{
  Error, Result,
  event::{IdentityTable, PriceTable, PurchaseEvent},
  ids::CustomerId,
  revenue::{CustomerRevenue, RevenueMap, UNKNOWN_IDENTITY},
};

/// Look up a customer's display identity, falling back to
/// [`UNKNOWN_IDENTITY`] when none is recorded or the recorded one is empty.
pub fn resolve_identity(identities: &IdentityTable, customer: CustomerId) -> String {
  identities
    .get(&customer)
    .filter(|identity| !identity.is_empty())
    .map_or_else(|| UNKNOWN_IDENTITY.to_owned(), Clone::clone)
}

fn add_revenue(customer: CustomerId, total: &mut Decimal, amount: Decimal) -> Result<()> {
  *total = total
    .checked_add(amount)
    .ok_or(Error::RevenueOverflow { customer })?;
  Ok(())
}

/// Total revenue per customer over `events`.
///
/// Missing prices count as zero and missing identities resolve to
/// [`UNKNOWN_IDENTITY`]; neither is an error. Inputs are not modified.
///
/// # Errors
///
/// [`Error::RevenueOverflow`] if a contribution or a running total does not
/// fit a `Decimal`.
pub fn aggregate(
  events: &[PurchaseEvent],
  prices: &PriceTable,
  identities: &IdentityTable,
) -> Result<RevenueMap> {
  let mut revenues = RevenueMap::new();
  for event in events {
    let contribution = event.contribution(prices)?;
    match revenues.entry(event.customer) {
      Entry::Occupied(mut e) => {
        add_revenue(event.customer, &mut e.get_mut().revenue, contribution)?;
      }
      Entry::Vacant(e) => {
        e.insert(CustomerRevenue {
          customer: event.customer,
          identity: resolve_identity(identities, event.customer),
          revenue:  contribution,
        });
      }
    }
  }
  Ok(revenues)
}

/// Same result as [`aggregate`], computed over `shards` contiguous slices of
/// `events` on scoped worker threads and merged afterwards.
///
/// `shards` of 0 is treated as 1.
pub fn aggregate_sharded(
  events: &[PurchaseEvent],
  prices: &PriceTable,
  identities: &IdentityTable,
  shards: usize,
) -> Result<RevenueMap> {
  let shards = shards.max(1);
  if shards == 1 || events.len() < 2 {
    return aggregate(events, prices, identities);
  }

  let chunk_size = events.len().div_ceil(shards);
  thread::scope(|scope| {
    let workers: Vec<_> = events
      .chunks(chunk_size)
      .map(|chunk| scope.spawn(move || aggregate(chunk, prices, identities)))
      .collect();

    workers.into_iter().try_fold(RevenueMap::new(), |acc, worker| {
      // A worker only panics if `aggregate` itself does; surface it as-is.
      let partial = worker
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))?;
      merge(acc, partial)
    })
  })
}

/// Combine two partial revenue maps, summing revenue for shared customers.
///
/// Identities are resolved from the same table on both sides, so the one
/// already in `into` is kept.
pub fn merge(mut into: RevenueMap, from: RevenueMap) -> Result<RevenueMap> {
  for (customer, partial) in from {
    match into.entry(customer) {
      Entry::Occupied(mut e) => {
        add_revenue(customer, &mut e.get_mut().revenue, partial.revenue)?;
      }
      Entry::Vacant(e) => {
        e.insert(partial);
      }
    }
  }
  Ok(into)
}


#[cfg(test)]
mod tests {
  use chrono::{DateTime, Duration, TimeZone, Utc};

  use super::*;
  use crate::ids::ContentId;

  fn dec(s: &str) -> Decimal { s.parse().unwrap() }

  fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2020, 4, 1, 0, 0, 0).unwrap() }

  fn event(content: i32, customer: i64, quantity: i32) -> PurchaseEvent {
    PurchaseEvent::new(ContentId(content), CustomerId(customer), quantity, t0())
  }

  fn example_inputs() -> (Vec<PurchaseEvent>, PriceTable, IdentityTable) {
    let events = vec![event(1, 100, 2), event(1, 100, 1), event(2, 200, 5)];
    let prices = PriceTable::from([
      (ContentId(1), dec("10.0")),
      (ContentId(2), dec("3.0")),
    ]);
    let identities = IdentityTable::from([(CustomerId(100), "a@x.com".to_owned())]);
    (events, prices, identities)
  }

  /// A few hundred events over a handful of customers with awkward prices.
  fn bulk_inputs() -> (Vec<PurchaseEvent>, PriceTable, IdentityTable) {
    let prices: PriceTable = (0..7)
      .map(|c| (ContentId(c), dec("0.1") * Decimal::from(c * 3 + 1) + dec("0.07")))
      .collect();
    let events = (0..500)
      .map(|i| {
        let mut e = event(i % 9, i64::from(i % 13), (i % 5) - 1);
        e.event_time = t0() + Duration::minutes(i64::from(i));
        e
      })
      .collect();
    let identities = (0..13)
      .filter(|c| c % 2 == 0)
      .map(|c| (CustomerId(c), format!("c{c}@example.com")))
      .collect();
    (events, prices, identities)
  }

  #[test]
  fn example_scenario() {
    let (events, prices, identities) = example_inputs();
    let revenues = aggregate(&events, &prices, &identities).unwrap();

    assert_eq!(revenues.len(), 2);
    let a = &revenues[&CustomerId(100)];
    assert_eq!(a.revenue, dec("30"));
    assert_eq!(a.identity, "a@x.com");
    let b = &revenues[&CustomerId(200)];
    assert_eq!(b.revenue, dec("15"));
    assert_eq!(b.identity, UNKNOWN_IDENTITY);
  }

  #[test]
  fn empty_events_give_empty_map() {
    let (_, prices, identities) = example_inputs();
    assert!(aggregate(&[], &prices, &identities).unwrap().is_empty());
    assert!(aggregate_sharded(&[], &prices, &identities, 4).unwrap().is_empty());
  }

  #[test]
  fn unknown_content_still_creates_customer_with_zero_revenue() {
    let (_, prices, identities) = example_inputs();
    let revenues = aggregate(&[event(99, 100, 4)], &prices, &identities).unwrap();
    assert_eq!(revenues[&CustomerId(100)].revenue, Decimal::ZERO);
    assert_eq!(revenues[&CustomerId(100)].identity, "a@x.com");
  }

  #[test]
  fn order_does_not_matter() {
    let (events, prices, identities) = bulk_inputs();
    let forward = aggregate(&events, &prices, &identities).unwrap();

    let mut reversed = events.clone();
    reversed.reverse();
    assert_eq!(aggregate(&reversed, &prices, &identities).unwrap(), forward);

    let mut interleaved = events.clone();
    interleaved.sort_by_key(|e| (e.content, std::cmp::Reverse(e.customer)));
    assert_eq!(aggregate(&interleaved, &prices, &identities).unwrap(), forward);
  }

  #[test]
  fn revenue_is_conserved_per_customer() {
    let (events, prices, identities) = bulk_inputs();
    let revenues = aggregate(&events, &prices, &identities).unwrap();

    for (customer, rev) in &revenues {
      let expected: Decimal = events
        .iter()
        .filter(|e| e.customer == *customer)
        .map(|e| {
          Decimal::from(e.quantity)
            * prices.get(&e.content).copied().unwrap_or_default()
        })
        .sum();
      assert_eq!(rev.revenue, expected, "customer {customer}");
    }
  }

  #[test]
  fn sharded_matches_sequential() {
    let (events, prices, identities) = bulk_inputs();
    let sequential = aggregate(&events, &prices, &identities).unwrap();
    for shards in [0, 1, 2, 3, 8, 64, 1000] {
      assert_eq!(
        aggregate_sharded(&events, &prices, &identities, shards).unwrap(),
        sequential,
        "shards = {shards}"
      );
    }
  }

  #[test]
  fn inputs_are_untouched() {
    let (events, prices, identities) = example_inputs();
    let (e2, p2, i2) = (events.clone(), prices.clone(), identities.clone());
    aggregate(&events, &prices, &identities).unwrap();
    assert_eq!(events, e2);
    assert_eq!(prices, p2);
    assert_eq!(identities, i2);
  }

  #[test]
  fn empty_identity_falls_back_to_unknown() {
    let identities = IdentityTable::from([(CustomerId(5), String::new())]);
    assert_eq!(resolve_identity(&identities, CustomerId(5)), UNKNOWN_IDENTITY);

    let prices = PriceTable::from([(ContentId(1), dec("2"))]);
    let revenues = aggregate(&[event(1, 5, 1)], &prices, &identities).unwrap();
    assert_eq!(revenues[&CustomerId(5)].identity, UNKNOWN_IDENTITY);
  }

  #[test]
  fn oversized_contribution_is_an_error() {
    let prices = PriceTable::from([(ContentId(1), Decimal::MAX)]);
    assert!(matches!(
      aggregate(&[event(1, 100, 10)], &prices, &IdentityTable::new()),
      Err(Error::RevenueOverflow { customer: CustomerId(100) })
    ));
  }

  #[test]
  fn overflowing_total_is_an_error() {
    let prices = PriceTable::from([(ContentId(1), Decimal::MAX)]);
    let events = [event(1, 100, 1), event(1, 200, 1), event(1, 100, 1)];
    assert!(matches!(
      aggregate(&events, &prices, &IdentityTable::new()),
      Err(Error::RevenueOverflow { customer: CustomerId(100) })
    ));
    // One event per shard, so the overflow only shows up in `merge`.
    assert!(matches!(
      aggregate_sharded(&events, &prices, &IdentityTable::new(), 3),
      Err(Error::RevenueOverflow { customer: CustomerId(100) })
    ));
  }
}

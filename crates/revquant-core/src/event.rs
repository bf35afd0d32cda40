//! Inputs to the aggregator: purchase events and the two lookup tables.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::FromPrimitive as _};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  ids::{ContentId, CustomerId},
};

/// Unit price per content id. Not guaranteed to cover every content id seen
/// in the events.
pub type PriceTable = HashMap<ContentId, Decimal>;

/// Display identity (an email address) per customer. Not guaranteed to cover
/// every customer seen in the events.
pub type IdentityTable = HashMap<CustomerId, String>;

/// A single purchase, as read from the event store. Never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEvent {
  pub content:    ContentId,
  pub customer:   CustomerId,
  /// Signed so that refunds recorded as negative quantities pass through.
  pub quantity:   i32,
  pub event_time: DateTime<Utc>,
}

impl PurchaseEvent {
  pub fn new(
    content: ContentId,
    customer: CustomerId,
    quantity: i32,
    event_time: DateTime<Utc>,
  ) -> Self {
    Self { content, customer, quantity, event_time }
  }

  /// `quantity × unit price`, with a missing price counting as zero.
  ///
  /// Fails with [`Error::RevenueOverflow`] if the product does not fit a
  /// [`Decimal`].
  pub fn contribution(&self, prices: &PriceTable) -> Result<Decimal> {
    let price = prices.get(&self.content).copied().unwrap_or(Decimal::ZERO);
    Decimal::from(self.quantity)
      .checked_mul(price)
      .ok_or(Error::RevenueOverflow { customer: self.customer })
  }
}

/// Convert a floating-point price read from storage into a [`Decimal`].
///
/// Rejects NaN, infinities and magnitudes outside the decimal range.
pub fn price_from_f64(content: ContentId, price: f64) -> Result<Decimal> {
  Decimal::from_f64(price).ok_or(Error::InvalidPrice { content, price })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at() -> DateTime<Utc> { Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap() }

  fn dec(s: &str) -> Decimal { s.parse().unwrap() }

  #[test]
  fn contribution_multiplies_quantity_by_price() {
    let prices = PriceTable::from([(ContentId(1), dec("9.99"))]);
    let event = PurchaseEvent::new(ContentId(1), CustomerId(7), 3, at());
    assert_eq!(event.contribution(&prices).unwrap(), dec("29.97"));
  }

  #[test]
  fn missing_price_contributes_nothing() {
    let event = PurchaseEvent::new(ContentId(42), CustomerId(7), 3, at());
    assert_eq!(event.contribution(&PriceTable::new()).unwrap(), Decimal::ZERO);
  }

  #[test]
  fn negative_quantity_is_a_refund() {
    let prices = PriceTable::from([(ContentId(1), dec("10"))]);
    let event = PurchaseEvent::new(ContentId(1), CustomerId(7), -2, at());
    assert_eq!(event.contribution(&prices).unwrap(), dec("-20"));
  }

  #[test]
  fn oversized_product_is_an_error() {
    let price = price_from_f64(ContentId(1), 1e28).unwrap();
    let prices = PriceTable::from([(ContentId(1), price)]);
    let event = PurchaseEvent::new(ContentId(1), CustomerId(7), 10, at());
    assert!(matches!(
      event.contribution(&prices),
      Err(Error::RevenueOverflow { customer: CustomerId(7) })
    ));
  }

  #[test]
  fn non_finite_price_is_rejected() {
    assert!(matches!(
      price_from_f64(ContentId(3), f64::NAN),
      Err(Error::InvalidPrice { content: ContentId(3), .. })
    ));
    assert_eq!(price_from_f64(ContentId(3), 2.5).unwrap(), dec("2.5"));
  }
}

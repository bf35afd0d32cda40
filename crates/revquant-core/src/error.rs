//! Error types for `revquant-core`.

use thiserror::Error;

use crate::ids::{ContentId, CustomerId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("quantile must be in (0, 1], got {0}")]
  InvalidQuantile(f64),

  #[error(
    "insufficient population: {customers} customers cannot fill {buckets} \
     quantile buckets"
  )]
  InsufficientPopulation { customers: usize, buckets: usize },

  #[error("invalid export table name: {0:?}")]
  InvalidTableName(String),

  #[error("price for content {content} is not representable as a decimal: {price}")]
  InvalidPrice { content: ContentId, price: f64 },

  /// Revenue for one customer left the range a `Decimal` can hold.
  #[error("revenue for customer {customer} overflowed")]
  RevenueOverflow { customer: CustomerId },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

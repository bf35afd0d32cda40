//! Opaque identifiers for customers and purchasable content.
//!
//! Both are plain integers in the source store. They are wrapped so a
//! content id can never be used to look up a customer and vice versa.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a customer. Ordered so revenue maps enumerate
/// deterministically and ties can be broken on it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

/// Identifies a purchasable piece of content.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct ContentId(pub i32);

impl fmt::Display for CustomerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl fmt::Display for ContentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<i64> for CustomerId {
  fn from(id: i64) -> Self { Self(id) }
}

impl From<i32> for ContentId {
  fn from(id: i32) -> Self { Self(id) }
}

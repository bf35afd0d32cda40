//! The collaborator traits around the engine: where inputs come from and
//! where the ranked result goes.
//!
//! Implemented by storage backends (e.g. `revquant-store-sqlite`). The
//! pipeline in `revquant-cli` depends on these abstractions, not on any
//! concrete backend.

use std::{fmt, future::Future};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  event::{IdentityTable, PriceTable, PurchaseEvent},
  revenue::RevenueMap,
};

// ─── Destination handle ──────────────────────────────────────────────────────

/// Name of the table the top customers are exported into.
///
/// Table names are interpolated into DDL, so only plain SQL identifiers are
/// accepted: an ASCII letter or underscore followed by letters, digits or
/// underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExportTable(String);

impl ExportTable {
  pub fn new(name: impl Into<String>) -> Result<Self> {
    let name = name.into();
    let mut chars = name.chars();
    let head_ok = chars
      .next()
      .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
      Ok(Self(name))
    } else {
      Err(Error::InvalidTableName(name))
    }
  }

  /// `<prefix>_<YYYYMMDD>`, one table per run date.
  pub fn dated(prefix: &str, date: NaiveDate) -> Result<Self> {
    Self::new(format!("{prefix}_{}", date.format("%Y%m%d")))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for ExportTable {
  type Error = Error;

  fn try_from(name: String) -> Result<Self> { Self::new(name) }
}

impl From<ExportTable> for String {
  fn from(t: ExportTable) -> Self { t.0 }
}

impl fmt::Display for ExportTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Export summary ──────────────────────────────────────────────────────────

/// Aggregate figures over an export table, as persisted (i.e. rounded).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportStats {
  pub count:   u64,
  pub total:   f64,
  pub average: f64,
  pub max:     f64,
  pub min:     f64,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Where the engine's inputs come from.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait PurchaseSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Customer → identity, from channel rows of type `channel_type`
  /// (email is `1` in the reference schema).
  fn load_identities(
    &self,
    channel_type: i16,
  ) -> impl Future<Output = Result<IdentityTable, Self::Error>> + Send + '_;

  /// Content → unit price.
  fn load_prices(
    &self,
  ) -> impl Future<Output = Result<PriceTable, Self::Error>> + Send + '_;

  /// Events of type `event_type` (purchase is `6` in the reference schema)
  /// dated on or after `since`.
  fn load_purchase_events(
    &self,
    event_type: i16,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<PurchaseEvent>, Self::Error>> + Send + '_;
}

/// Where the ranked result goes.
pub trait RevenueSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create `table` if needed and upsert every customer in `customers`,
  /// keyed by customer id. Re-exporting a customer overwrites its identity
  /// and revenue. Returns the number of rows written.
  fn export_top<'a>(
    &'a self,
    table: &'a ExportTable,
    customers: &'a RevenueMap,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Count, sum, average, max and min of the revenue stored in `table`.
  fn export_stats<'a>(
    &'a self,
    table: &'a ExportTable,
  ) -> impl Future<Output = Result<ExportStats, Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dated_table_name() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    let table = ExportTable::dated("top_customers", date).unwrap();
    assert_eq!(table.as_str(), "top_customers_20240309");
  }

  #[test]
  fn rejects_names_that_are_not_identifiers() {
    for bad in ["", "1abc", "drop table;", "a-b", "naïve", "x y"] {
      assert!(
        matches!(ExportTable::new(bad), Err(Error::InvalidTableName(_))),
        "{bad:?} should be rejected"
      );
    }
    assert!(ExportTable::new("_t2").is_ok());
  }
}

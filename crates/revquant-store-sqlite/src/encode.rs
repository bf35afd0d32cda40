//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings, so lexical comparison in
//! SQL matches chronological order. Exported revenue is stored as its
//! rounded decimal text, which the `NUMERIC` column converts without going
//! through a binary float.

use chrono::{DateTime, SecondsFormat, Utc};
use revquant_core::{
  event::PurchaseEvent,
  ids::{ContentId, CustomerId},
  revenue::CustomerRevenue,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Ids ─────────────────────────────────────────────────────────────────────

pub fn decode_content_id(raw: i64) -> Result<ContentId> {
  i32::try_from(raw)
    .map(ContentId)
    .map_err(|_| Error::OutOfRange { column: "ContentID", value: raw })
}

pub fn decode_quantity(raw: i64) -> Result<i32> {
  i32::try_from(raw).map_err(|_| Error::OutOfRange { column: "Quantity", value: raw })
}

// ─── Revenue ─────────────────────────────────────────────────────────────────

/// The persisted `CA` value: revenue rounded to two places, as text.
pub fn encode_revenue(rev: &CustomerRevenue) -> String {
  rev.rounded_revenue().to_string()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `CustomerEventData` row.
pub struct RawEvent {
  pub content_id:  i64,
  pub customer_id: i64,
  pub quantity:    i64,
  pub event_date:  String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<PurchaseEvent> {
    Ok(PurchaseEvent {
      content:    decode_content_id(self.content_id)?,
      customer:   CustomerId(self.customer_id),
      quantity:   decode_quantity(self.quantity)?,
      event_time: decode_dt(&self.event_date)?,
    })
  }
}

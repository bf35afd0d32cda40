//! [`SqliteStore`], the SQLite implementation of [`PurchaseSource`] and
//! [`RevenueSink`].

use std::path::Path;

use chrono::{DateTime, Utc};
use revquant_core::{
  event::{IdentityTable, PriceTable, PurchaseEvent, price_from_f64},
  ids::{ContentId, CustomerId},
  revenue::{CustomerRevenue, RevenueMap},
  store::{ExportStats, ExportTable, PurchaseSource, RevenueSink},
};

use crate::{
  Error, Result,
  encode::{RawEvent, decode_content_id, encode_dt, encode_revenue},
  schema::{SCHEMA, export_stats_sql, export_table_ddl, export_upsert_sql},
};

/// Rows upserted per export transaction.
pub const EXPORT_BATCH_SIZE: usize = 1000;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A revquant store backed by a single SQLite file.
///
/// Cloning shares the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, as used by the tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Version string of the linked SQLite library.
  pub async fn server_version(&self) -> Result<String> {
    let version = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?)
      })
      .await?;
    Ok(version)
  }

  // ── Source writes ─────────────────────────────────────────────────────────
  //
  // The loader only reads; these exist to seed a store for tests and demos.

  /// Record a contact channel value for a customer.
  pub async fn insert_channel(
    &self,
    customer: CustomerId,
    channel_type: i16,
    value: impl Into<String>,
  ) -> Result<()> {
    let value = value.into();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO CustomerData (CustomerID, ChannelTypeID, ChannelValue)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![customer.0, channel_type, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Record a unit price for a content id.
  pub async fn insert_price(
    &self,
    content: ContentId,
    price: f64,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ContentPrice (ContentID, Price) VALUES (?1, ?2)",
          rusqlite::params![content.0, price],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Record events of `event_type`, all in one transaction.
  pub async fn insert_events(
    &self,
    event_type: i16,
    events: &[PurchaseEvent],
  ) -> Result<()> {
    let rows: Vec<(i32, i64, i32, String)> = events
      .iter()
      .map(|e| (e.content.0, e.customer.0, e.quantity, encode_dt(e.event_time)))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO CustomerEventData
               (EventID, ContentID, CustomerID, EventTypeID, EventDate, Quantity)
             VALUES (
               (SELECT COALESCE(MAX(EventID), 0) + 1 FROM CustomerEventData),
               ?1, ?2, ?3, ?4, ?5
             )",
          )?;
          for (content, customer, quantity, date) in &rows {
            stmt.execute(rusqlite::params![
              content, customer, event_type, date, quantity
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PurchaseSource impl ─────────────────────────────────────────────────────

impl PurchaseSource for SqliteStore {
  type Error = Error;

  async fn load_identities(&self, channel_type: i16) -> Result<IdentityTable> {
    let rows: Vec<(i64, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT CustomerID, ChannelValue
           FROM CustomerData
           WHERE ChannelTypeID = ?1
           ORDER BY CustomerChannelID",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![channel_type], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(rows = rows.len(), channel_type, "loaded identity rows");
    // Later rows win, so the most recently inserted channel value is used.
    Ok(rows.into_iter().map(|(id, v)| (CustomerId(id), v)).collect())
  }

  async fn load_prices(&self) -> Result<PriceTable> {
    let rows: Vec<(i64, f64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT ContentID, Price FROM ContentPrice ORDER BY ContentPriceID",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(rows = rows.len(), "loaded price rows");
    rows
      .into_iter()
      .map(|(raw_id, price)| -> Result<_> {
        let content = decode_content_id(raw_id)?;
        Ok((content, price_from_f64(content, price)?))
      })
      .collect()
  }

  async fn load_purchase_events(
    &self,
    event_type: i16,
    since: DateTime<Utc>,
  ) -> Result<Vec<PurchaseEvent>> {
    let since_str = encode_dt(since);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT ContentID, CustomerID, Quantity, EventDate
           FROM CustomerEventData
           WHERE EventTypeID = ?1 AND EventDate >= ?2
           ORDER BY EventDataID",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![event_type, since_str], |row| {
            Ok(RawEvent {
              content_id:  row.get(0)?,
              customer_id: row.get(1)?,
              quantity:    row.get(2)?,
              event_date:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(rows = raws.len(), event_type, %since, "loaded event rows");
    raws.into_iter().map(RawEvent::into_event).collect()
  }
}

// ─── RevenueSink impl ────────────────────────────────────────────────────────

impl RevenueSink for SqliteStore {
  type Error = Error;

  async fn export_top(
    &self,
    table: &ExportTable,
    customers: &RevenueMap,
  ) -> Result<usize> {
    let ddl = export_table_ddl(table);
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;
    tracing::debug!(%table, "export table ready");

    if customers.is_empty() {
      tracing::warn!(%table, "no customers to export");
      return Ok(0);
    }

    let rows: Vec<(i64, String, String)> = customers
      .values()
      .map(|c: &CustomerRevenue| (c.customer.0, c.identity.clone(), encode_revenue(c)))
      .collect();
    let total = rows.len();
    let batches = total.div_ceil(EXPORT_BATCH_SIZE);

    for (n, batch) in rows.chunks(EXPORT_BATCH_SIZE).enumerate() {
      let batch = batch.to_vec();
      let upsert = export_upsert_sql(table);
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          {
            let mut stmt = tx.prepare(&upsert)?;
            for (customer, email, revenue) in &batch {
              stmt.execute(rusqlite::params![customer, email, revenue])?;
            }
          }
          tx.commit()?;
          Ok(())
        })
        .await?;
      tracing::debug!(%table, batch = n + 1, of = batches, "export batch written");
    }

    Ok(total)
  }

  async fn export_stats(&self, table: &ExportTable) -> Result<ExportStats> {
    let sql = export_stats_sql(table);
    let (count, total, average, max, min): (i64, f64, f64, f64, f64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, [], |row| {
          Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?)
      })
      .await?;

    let count = u64::try_from(count)
      .map_err(|_| Error::OutOfRange { column: "COUNT(*)", value: count })?;
    Ok(ExportStats { count, total, average, max, min })
  }
}

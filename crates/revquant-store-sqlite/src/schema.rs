//! SQL schema for the revquant SQLite store.
//!
//! The source tables mirror the customer/content/event layout the loader
//! reads from. They are created on open so an empty file is a valid store.

use revquant_core::store::ExportTable;

/// `CustomerData.ChannelTypeID` of email rows.
pub const EMAIL_CHANNEL_TYPE: i16 = 1;

/// `CustomerEventData.EventTypeID` of purchase events.
pub const PURCHASE_EVENT_TYPE: i16 = 6;

/// Source tables DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per contact channel (email, phone, ...) of a customer.
CREATE TABLE IF NOT EXISTS CustomerData (
    CustomerChannelID INTEGER PRIMARY KEY,
    CustomerID        INTEGER NOT NULL,
    ChannelTypeID     INTEGER NOT NULL,  -- 1 = email
    ChannelValue      TEXT    NOT NULL,
    InsertDate        TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS ContentPrice (
    ContentPriceID INTEGER PRIMARY KEY,
    ContentID      INTEGER NOT NULL,
    Price          REAL    NOT NULL,
    Currency       TEXT    NOT NULL DEFAULT 'EUR',
    InsertDate     TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS CustomerEventData (
    EventDataID INTEGER PRIMARY KEY,
    EventID     INTEGER NOT NULL,
    ContentID   INTEGER NOT NULL,
    CustomerID  INTEGER NOT NULL,
    EventTypeID INTEGER NOT NULL,        -- 6 = purchase
    EventDate   TEXT    NOT NULL,        -- RFC 3339 UTC
    Quantity    INTEGER NOT NULL,
    InsertDate  TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS CustomerData_channel_idx
    ON CustomerData(ChannelTypeID);
CREATE INDEX IF NOT EXISTS CustomerEventData_type_date_idx
    ON CustomerEventData(EventTypeID, EventDate);

PRAGMA user_version = 1;
";

/// DDL for one export table. `table` is a validated identifier, which is
/// what makes the interpolation safe.
pub fn export_table_ddl(table: &ExportTable) -> String {
  format!(
    "CREATE TABLE IF NOT EXISTS {table} (
         CustomerID INTEGER PRIMARY KEY,
         Email      TEXT    NOT NULL,
         CA         NUMERIC NOT NULL,
         InsertDate TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP,
         UpdateDate TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
     );
     CREATE INDEX IF NOT EXISTS {table}_ca_idx ON {table}(CA DESC);"
  )
}

/// Upsert statement for one export row.
pub fn export_upsert_sql(table: &ExportTable) -> String {
  format!(
    "INSERT INTO {table} (CustomerID, Email, CA) VALUES (?1, ?2, ?3)
     ON CONFLICT (CustomerID) DO UPDATE SET
         Email      = excluded.Email,
         CA         = excluded.CA,
         UpdateDate = CURRENT_TIMESTAMP"
  )
}

/// Summary query over an export table.
pub fn export_stats_sql(table: &ExportTable) -> String {
  format!(
    "SELECT COUNT(*), TOTAL(CA), COALESCE(AVG(CA), 0.0),
            COALESCE(MAX(CA), 0.0), COALESCE(MIN(CA), 0.0)
     FROM {table}"
  )
}

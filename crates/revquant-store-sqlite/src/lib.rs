//! SQLite backend for revquant: loads purchase inputs and exports the ranked
//! top customers.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::{EMAIL_CHANNEL_TYPE, PURCHASE_EVENT_TYPE};
pub use store::{EXPORT_BATCH_SIZE, SqliteStore};

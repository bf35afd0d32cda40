//! Runtime configuration, layered from defaults, an optional TOML file,
//! `REVQUANT_*` environment variables and command-line overrides.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use config::{Config, ConfigError, Environment, File};
use revquant_core::Quantile;
use serde::Deserialize;

/// Settings for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
  /// SQLite file holding the source tables and receiving the export.
  pub store_path:          PathBuf,
  pub quantile:            Quantile,
  /// Events dated before this day (UTC) are ignored.
  pub since:               NaiveDate,
  pub email_channel_type:  i16,
  pub purchase_event_type: i16,
  /// Export table name is `<export_prefix>_<YYYYMMDD>`.
  pub export_prefix:       String,
  /// Customers printed in the preview sample; 0 disables it.
  pub sample_size:         usize,
  #[serde(default)]
  pub sample_seed:         Option<u64>,
  /// Worker threads used for aggregation.
  pub shards:              usize,
  /// Compute only; skip the export phase.
  pub dry_run:             bool,
}

/// Values supplied on the command line; `None` leaves the layered value.
#[derive(Debug, Default)]
pub struct Overrides {
  pub quantile: Option<f64>,
  pub since:    Option<NaiveDate>,
  pub dry_run:  Option<bool>,
}

impl PipelineConfig {
  /// Build the layered configuration. A missing file is not an error.
  pub fn load(file: &Path, overrides: Overrides) -> Result<Self, ConfigError> {
    Config::builder()
      .set_default("store_path", "revquant.db")?
      .set_default("quantile", 0.025_f64)?
      .set_default("since", "2020-04-01")?
      .set_default("email_channel_type", 1_i64)?
      .set_default("purchase_event_type", 6_i64)?
      .set_default("export_prefix", "top_customers")?
      .set_default("sample_size", 10_i64)?
      .set_default("shards", 1_i64)?
      .set_default("dry_run", false)?
      .add_source(File::from(file).required(false))
      .add_source(Environment::with_prefix("REVQUANT"))
      .set_override_option("quantile", overrides.quantile)?
      .set_override_option("since", overrides.since.map(|d| d.to_string()))?
      .set_override_option("dry_run", overrides.dry_run)?
      .build()?
      .try_deserialize()
  }

  /// Start of the event window as a UTC instant.
  pub fn since_instant(&self) -> DateTime<Utc> {
    self.since.and_time(NaiveTime::MIN).and_utc()
  }
}

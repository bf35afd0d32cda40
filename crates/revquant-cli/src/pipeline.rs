//! The batch run: LOAD → COMPUTE → EXPORT over any store implementing the
//! collaborator traits.

use std::time::Instant;

use anyhow::Context as _;
use chrono::NaiveDate;
use rand::Rng;
use revquant_core::{
  Error as CoreError,
  aggregate::aggregate_sharded,
  event::{IdentityTable, PriceTable, PurchaseEvent},
  revenue::{QuantileBucket, RevenueMap},
  sample::sample,
  select::select_top_with,
  stats::compute_stats_with,
  store::{ExportStats, ExportTable, PurchaseSource, RevenueSink},
};

use crate::config::PipelineConfig;

/// What a run produced, for the closing summary and for tests.
#[derive(Debug)]
pub struct RunSummary {
  pub customers:    usize,
  pub top:          RevenueMap,
  pub buckets:      Vec<QuantileBucket>,
  /// `None` on a dry run.
  pub export:       Option<ExportOutcome>,
}

#[derive(Debug)]
pub struct ExportOutcome {
  pub table: ExportTable,
  pub rows:  usize,
  /// `None` if the stats query failed; that only warrants a warning.
  pub stats: Option<ExportStats>,
}

struct Inputs {
  identities: IdentityTable,
  prices:     PriceTable,
  events:     Vec<PurchaseEvent>,
}

/// Run the whole pipeline against `store`. `run_date` stamps the export
/// table; `rng` drives the preview sample.
pub async fn run<S, R>(
  store: &S,
  cfg: &PipelineConfig,
  run_date: NaiveDate,
  rng: &mut R,
) -> anyhow::Result<RunSummary>
where
  S: PurchaseSource + RevenueSink,
  R: Rng + ?Sized,
{
  let inputs = load(store, cfg).await?;

  // ── COMPUTE ───────────────────────────────────────────────────────────────
  let started = Instant::now();

  let revenues =
    aggregate_sharded(&inputs.events, &inputs.prices, &inputs.identities, cfg.shards)
      .context("failed to calculate customer revenue")?;
  tracing::info!(
    customers = revenues.len(),
    events = inputs.events.len(),
    shards = cfg.shards,
    elapsed = ?started.elapsed(),
    "calculated customer revenue"
  );
  log_sample(&revenues, cfg.sample_size, rng);

  let top = select_top_with(&revenues, cfg.quantile);
  tracing::info!(top = top.len(), quantile = %cfg.quantile, "identified top customers");

  let buckets = match compute_stats_with(&revenues, cfg.quantile) {
    Ok(buckets) => buckets,
    Err(e @ CoreError::InsufficientPopulation { .. }) => {
      tracing::warn!(error = %e, "skipping quantile statistics");
      Vec::new()
    }
    Err(e) => return Err(e).context("failed to calculate quantile statistics"),
  };
  log_buckets(&buckets, cfg.quantile.get());

  tracing::info!(elapsed = ?started.elapsed(), "COMPUTE phase completed");

  // ── EXPORT ────────────────────────────────────────────────────────────────
  let export = if cfg.dry_run {
    tracing::info!("dry run: skipping EXPORT phase");
    None
  } else {
    Some(export(store, cfg, run_date, &top).await?)
  };

  Ok(RunSummary { customers: revenues.len(), top, buckets, export })
}

async fn load<S: PurchaseSource>(store: &S, cfg: &PipelineConfig) -> anyhow::Result<Inputs> {
  let started = Instant::now();

  let identities = store
    .load_identities(cfg.email_channel_type)
    .await
    .context("failed to load customer identities")?;
  tracing::info!(count = identities.len(), "loaded customer identities");

  let prices = store
    .load_prices()
    .await
    .context("failed to load content prices")?;
  tracing::info!(count = prices.len(), "loaded content prices");

  let since = cfg.since_instant();
  let events = store
    .load_purchase_events(cfg.purchase_event_type, since)
    .await
    .context("failed to load purchase events")?;
  tracing::info!(count = events.len(), %since, "loaded purchase events");

  tracing::info!(elapsed = ?started.elapsed(), "LOAD phase completed");
  Ok(Inputs { identities, prices, events })
}

async fn export<S: RevenueSink>(
  store: &S,
  cfg: &PipelineConfig,
  run_date: NaiveDate,
  top: &RevenueMap,
) -> anyhow::Result<ExportOutcome> {
  let started = Instant::now();
  let table = ExportTable::dated(&cfg.export_prefix, run_date)
    .context("invalid export table name")?;

  let rows = store
    .export_top(&table, top)
    .await
    .with_context(|| format!("failed to export top customers to {table}"))?;
  tracing::info!(rows, %table, "exported top customers");

  let stats = match store.export_stats(&table).await {
    Ok(stats) => {
      tracing::info!(
        %table,
        customers = stats.count,
        total = %format!("{:.2}", stats.total),
        average = %format!("{:.2}", stats.average),
        max = %format!("{:.2}", stats.max),
        min = %format!("{:.2}", stats.min),
        "export statistics"
      );
      Some(stats)
    }
    Err(e) => {
      tracing::warn!(error = %e, %table, "could not read export statistics");
      None
    }
  };

  tracing::info!(elapsed = ?started.elapsed(), "EXPORT phase completed");
  Ok(ExportOutcome { table, rows, stats })
}

fn log_sample<R: Rng + ?Sized>(revenues: &RevenueMap, count: usize, rng: &mut R) {
  if count == 0 {
    return;
  }
  for c in sample(revenues, count, rng) {
    tracing::info!(
      customer = %c.customer,
      identity = %c.identity,
      revenue = %c.rounded_revenue(),
      "sampled customer"
    );
  }
}

fn log_buckets(buckets: &[QuantileBucket], quantile: f64) {
  for b in buckets {
    tracing::info!(
      bucket = b.index,
      range = %format!("{:.1}%-{:.1}%", b.lower_percent(quantile), b.upper_percent(quantile)),
      customers = b.customer_count,
      max = %b.max_revenue.round_dp(2),
      min = %b.min_revenue.round_dp(2),
      "quantile bucket"
    );
  }
}

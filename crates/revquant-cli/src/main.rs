//! `revquant` binary.
//!
//! Reads `revquant.toml` (or the path given with `--config`), opens the
//! SQLite store, ranks customers by purchase revenue and exports the top
//! quantile into a dated table.
//!
//! ```
//! revquant --config revquant.toml --quantile 0.05 --seed 7
//! ```

use std::{
  path::{Path, PathBuf},
  time::Instant,
};

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use rand::{SeedableRng as _, rngs::StdRng};
use revquant_cli::{Overrides, PipelineConfig};
use revquant_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rank customers by revenue and export the top quantile")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "revquant.toml")]
  config: PathBuf,

  /// Fraction of customers to export, in (0, 1].
  #[arg(short, long)]
  quantile: Option<f64>,

  /// Ignore events dated before this day (YYYY-MM-DD, UTC).
  #[arg(long)]
  since: Option<NaiveDate>,

  /// Seed for the preview sample; takes precedence over `sample_seed`.
  #[arg(long)]
  seed: Option<u64>,

  /// Compute and log, but do not export.
  #[arg(long)]
  dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let started = Instant::now();

  // Load configuration.
  let cfg = PipelineConfig::load(&cli.config, Overrides {
    quantile: cli.quantile,
    since:    cli.since,
    dry_run:  cli.dry_run.then_some(true),
  })
  .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  tracing::info!(
    store = ?cfg.store_path,
    quantile = %cfg.quantile,
    since = %cfg.since,
    "configuration loaded"
  );

  // Expand `~` in store path.
  let store_path = expand_tilde(&cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  match store.server_version().await {
    Ok(version) => tracing::info!(%version, "connected to SQLite"),
    Err(e) => tracing::warn!(error = %e, "could not query SQLite version"),
  }

  let mut rng = match cli.seed.or(cfg.sample_seed) {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };

  let summary = revquant_cli::run(&store, &cfg, Utc::now().date_naive(), &mut rng).await?;

  tracing::info!(
    customers = summary.customers,
    top = summary.top.len(),
    quantile = %cfg.quantile,
    exported_to = ?summary.export.as_ref().map(|e| e.table.as_str()),
    elapsed = ?started.elapsed(),
    "process completed"
  );
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory as _;

  use super::*;

  #[test]
  fn plain_paths_are_unchanged() {
    assert_eq!(expand_tilde(Path::new("data/rq.db")), PathBuf::from("data/rq.db"));
  }

  #[test]
  fn cli_parses_overrides() {
    let cli = Cli::try_parse_from([
      "revquant", "--quantile", "0.1", "--since", "2022-02-03", "--dry-run",
    ])
    .unwrap();
    assert_eq!(cli.quantile, Some(0.1));
    assert_eq!(cli.since, NaiveDate::from_ymd_opt(2022, 2, 3));
    assert!(cli.dry_run);
    assert_eq!(cli.config, PathBuf::from("revquant.toml"));
  }

  #[test]
  fn seed_is_only_a_flag() {
    let cmd = Cli::command();
    let seed = cmd
      .get_arguments()
      .find(|arg| arg.get_id() == "seed")
      .unwrap();
    assert_eq!(seed.get_env(), None);

    let cli = Cli::try_parse_from(["revquant", "--seed", "7"]).unwrap();
    assert_eq!(cli.seed, Some(7));
  }
}

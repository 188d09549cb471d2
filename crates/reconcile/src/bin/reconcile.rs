//! Compares hiking time estimates of two profile service deployments.
//!
//! Run with:
//! ```
//! DATA_DIR=./data BEFORE_BASE_URL=... AFTER_BASE_URL=... cargo run -p reconcile --bin reconcile
//! ```

use reconcile::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ReconcileConfig::from_env()?;

    info!("1/2 Loading metadata from {}", config.metadata_path().display());
    let mut records = MetadataStore::new(&config.data_dir).load(&config.metadata_file)?;
    if let Some(max) = config.max_trails {
        records.truncate(max);
    }
    info!("Loaded {} trails", records.len());

    let (before, after) = HttpProfileSource::pair_from_config(&config)?;
    for source in [&before, &after] {
        if let Err(e) = source.check_health().await {
            warn!("{} profile service: {e}", source.name());
        }
    }

    info!("2/2 Loading profiles");
    let reconciled = BatchReconciler::new(&before, &after)
        .with_max_concurrent_requests(config.max_concurrent_requests)
        .run(records)
        .await;

    let report = Report::new(&reconciled);
    report.summary.log();
    report.write_to(&config.report_path)?;
    info!("Report written to {}", config.report_path.display());

    Ok(())
}

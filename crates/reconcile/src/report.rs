//! Reconciliation results as handed to presentation: a summary plus every trail record.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use hikingtime::{DirectionalDelta, TrailRecord, Trend};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error movement for one direction across all trails.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectionSummary {
    /// Trails whose error shrank (negative trend).
    pub improved: usize,
    /// Trails whose error grew (positive trend).
    pub regressed: usize,
    pub unchanged: usize,
    pub mean_delta_before: Option<f64>,
    pub mean_delta_after: Option<f64>,
}

impl DirectionSummary {
    fn from_records(
        records: &[TrailRecord],
        delta: fn(&DirectionalDelta) -> Option<f64>,
        trend: fn(&Trend) -> Option<f64>,
    ) -> Self {
        let mut summary = Self::default();

        for value in records
            .iter()
            .filter_map(|r| r.after.as_ref()?.trend.as_ref())
            .filter_map(trend)
        {
            if value < 0.0 {
                summary.improved += 1;
            } else if value > 0.0 {
                summary.regressed += 1;
            } else {
                summary.unchanged += 1;
            }
        }

        summary.mean_delta_before = mean(
            records
                .iter()
                .filter_map(|r| delta(&r.before.as_ref()?.delta_with_official)),
        );
        summary.mean_delta_after = mean(
            records
                .iter()
                .filter_map(|r| delta(&r.after.as_ref()?.delta_with_official)),
        );
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationSummary {
    pub trails: usize,
    pub before_failed: usize,
    pub after_failed: usize,
    pub start_to_finish: DirectionSummary,
    pub finish_to_start: DirectionSummary,
    /// Mean of `after - before` request latency, in milliseconds.
    pub mean_latency_trend_ms: Option<f64>,
}

impl ReconciliationSummary {
    pub fn from_records(records: &[TrailRecord]) -> Self {
        Self {
            trails: records.len(),
            before_failed: records.iter().filter(|r| r.before.is_none()).count(),
            after_failed: records.iter().filter(|r| r.after.is_none()).count(),
            start_to_finish: DirectionSummary::from_records(
                records,
                |d| d.start_to_finish,
                |t| t.start_to_finish,
            ),
            finish_to_start: DirectionSummary::from_records(
                records,
                |d| d.finish_to_start,
                |t| t.finish_to_start,
            ),
            mean_latency_trend_ms: mean(
                records
                    .iter()
                    .filter_map(|r| r.after.as_ref()?.trend.map(|t| t.request_latency_ms)),
            ),
        }
    }

    pub fn log(&self) {
        info!("Reconciliation summary:");
        info!("  Trails: {}", self.trails);
        info!("  Failed requests: before {}, after {}", self.before_failed, self.after_failed);
        for (label, direction) in [
            ("start -> finish", &self.start_to_finish),
            ("finish -> start", &self.finish_to_start),
        ] {
            info!(
                "  {label}: {} improved, {} regressed, {} unchanged",
                direction.improved, direction.regressed, direction.unchanged
            );
        }
        if let Some(trend) = self.mean_latency_trend_ms {
            info!("  Mean latency trend: {trend:.1} ms");
        }
    }
}

/// The document written at the end of a run.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: String,
    pub summary: ReconciliationSummary,
    pub trails: &'a [TrailRecord],
}

impl<'a> Report<'a> {
    pub fn new(trails: &'a [TrailRecord]) -> Self {
        Self {
            generated_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            summary: ReconciliationSummary::from_records(trails),
            trails,
        }
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

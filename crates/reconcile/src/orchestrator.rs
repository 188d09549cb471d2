//! Batch reconciliation of trail records against the "before" and "after" sources.
//!
//! Records are taken from a queue and reconciled one after the other: the "before"
//! profile is fetched and evaluated, then the "after" profile, whose estimate gets the
//! trend against "before" attached. Fetch failures are logged and leave the matching
//! estimate empty; they never stop the batch.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use hikingtime::{DirectionalEstimate, TrailRecord, evaluate_profile};
use tracing::{debug, info, warn};

use crate::api::ProfileSource;

/// How far a batch has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    total: usize,
    completed: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Marks one more record as done and returns the new completed count.
    pub fn record_completed(&mut self) -> usize {
        self.completed = (self.completed + 1).min(self.total);
        self.completed
    }

    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Drives a batch of [`TrailRecord`]s through both profile sources.
pub struct BatchReconciler<'a> {
    before: &'a dyn ProfileSource,
    after: &'a dyn ProfileSource,
    max_concurrent_requests: usize,
}

impl<'a> BatchReconciler<'a> {
    pub fn new(before: &'a dyn ProfileSource, after: &'a dyn ProfileSource) -> Self {
        Self {
            before,
            after,
            max_concurrent_requests: 1,
        }
    }

    /// Number of records reconciled at once. Values below 1 are treated as 1.
    pub fn with_max_concurrent_requests(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = limit.max(1);
        self
    }

    /// Reconciles every record and returns them, in input order, with their
    /// estimates filled in.
    pub async fn run(&self, records: Vec<TrailRecord>) -> Vec<TrailRecord> {
        let mut pending: VecDeque<TrailRecord> = records.into();
        let mut progress = Progress::new(pending.len());
        let mut results = Vec::with_capacity(progress.total());

        info!("Loading profiles... ({progress})");

        let mut reconciled = stream::iter(std::iter::from_fn(|| pending.pop_front()))
            .map(|record| self.reconcile(record))
            .buffered(self.max_concurrent_requests);

        while let Some(record) = reconciled.next().await {
            progress.record_completed();
            info!("Loading profiles... ({progress})");
            results.push(record);
        }

        debug_assert!(progress.is_done());
        info!("Loading done: {} trails reconciled", progress.completed());
        results
    }

    /// Fills the "before" and "after" estimates of a single record.
    pub async fn reconcile(&self, mut record: TrailRecord) -> TrailRecord {
        record.before = self.evaluate(self.before, &record).await;

        let after = self.evaluate(self.after, &record).await;
        record.after = match (after, &record.before) {
            (Some(after), Some(before)) => Some(after.with_trend_against(before)),
            (after, _) => after,
        };

        record
    }

    async fn evaluate(
        &self,
        source: &dyn ProfileSource,
        record: &TrailRecord,
    ) -> Option<DirectionalEstimate> {
        let started = Instant::now();

        match source.fetch_profile(&record.geometry).await {
            Ok(profile) => {
                let latency = started.elapsed();
                debug!(
                    "{} profile for \"{}\": {} samples in {:?}",
                    source.name(),
                    record.name,
                    profile.len(),
                    latency
                );
                Some(evaluate_profile(&profile, &record.official, latency))
            }
            Err(e) => {
                warn!(
                    "Error while requesting {} profile for \"{}\": {e}",
                    source.name(),
                    record.name
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_up_to_total() {
        let mut progress = Progress::new(2);
        assert!(!progress.is_done());
        assert_eq!(progress.record_completed(), 1);
        assert_eq!(progress.to_string(), "1/2");
        assert_eq!(progress.record_completed(), 2);
        assert!(progress.is_done());
        assert_eq!(progress.record_completed(), 2);
    }

    #[test]
    fn test_empty_progress_is_done() {
        assert!(Progress::new(0).is_done());
    }
}

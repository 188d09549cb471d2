//! Batch reconciliation of hiking time estimates.
//!
//! This crate validates a profile service migration: every trail of the metadata
//! export is sent to the current ("before") and the new ("after") deployment, hiking
//! times are estimated from both profiles, and their errors against the official
//! times are compared.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use reconcile::prelude::*;
//!
//! let config = ReconcileConfig::from_env()?;
//! let records = MetadataStore::new(&config.data_dir).load(&config.metadata_file)?;
//! let (before, after) = HttpProfileSource::pair_from_config(&config)?;
//!
//! let reconciled = BatchReconciler::new(&before, &after).run(records).await;
//! Report::new(&reconciled).write_to(&config.report_path)?;
//! ```

pub mod api;
pub mod config;
pub mod orchestrator;
pub mod report;
pub mod sources;

// Re-export core types from hikingtime crate
pub use hikingtime::{
    DirectionalEstimate, ElevationStats, OfficialTime, Profile, Sample, TrailGeometry,
    TrailRecord, Trend,
};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::api::{FetchError, HttpProfileSource, ProfileSource};
    pub use crate::config::{ProfileQuery, ReconcileConfig};
    pub use crate::orchestrator::{BatchReconciler, Progress};
    pub use crate::report::{ReconciliationSummary, Report};
    pub use crate::sources::MetadataStore;
    pub use crate::{OfficialTime, Profile, Sample, TrailGeometry, TrailRecord};
}

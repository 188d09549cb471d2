//! Hiking time estimation over elevation profiles.
//!
//! The crate turns an elevation profile (as served by the profile service) into an
//! estimated hiking duration for both directions, derives elevation statistics, and
//! compares two independently computed estimates against official reference times.
//!
//! Nothing in here performs I/O; fetching profiles and driving batches lives in the
//! `reconcile` crate.

pub mod comparison;
pub mod errors;
pub mod geometry;
pub mod hiking_time;
pub mod models;
pub mod statistics;

pub use comparison::{evaluate_profile, latency_trend, trend_between, trend_difference};
pub use errors::ProfileError;
pub use geometry::reverse_profile;
pub use hiking_time::estimate;
pub use models::{
    COMB, DirectionalDelta, DirectionalEstimate, ElevationStats, Minutes, OfficialTime, Profile,
    ReferenceStats, Sample, TrailGeometry, TrailRecord, Trend,
};
pub use statistics::compute_statistics;

//! Reconciliation of computed estimates against official times and against each other.

use std::time::Duration;

use crate::geometry::reverse_profile;
use crate::hiking_time::estimate;
use crate::models::{
    DirectionalDelta, DirectionalEstimate, Minutes, OfficialTime, Profile, Trend,
};
use crate::statistics::compute_statistics;

/// Signed change between two errors measured for the same direction.
///
/// When both values share a sign class (both negative, or both non-negative) the
/// result is `post - pre`, so a shrinking error gives a negative trend. Mixed sign
/// classes return `post + pre`.
pub fn trend_difference(pre: f64, post: f64) -> f64 {
    if (pre < 0.0) == (post < 0.0) {
        post - pre
    } else {
        post + pre
    }
}

/// `after - before`, in milliseconds.
pub fn latency_trend(before: Duration, after: Duration) -> f64 {
    (after.as_secs_f64() - before.as_secs_f64()) * 1000.0
}

/// Estimates both directions of `profile` and measures them against `official`.
///
/// `latency` is the time it took to obtain the profile; it is only carried along.
pub fn evaluate_profile(
    profile: &Profile,
    official: &OfficialTime,
    latency: Duration,
) -> DirectionalEstimate {
    let start_to_finish = estimate(profile);
    let finish_to_start = estimate(&reverse_profile(profile));

    DirectionalEstimate {
        start_to_finish,
        finish_to_start,
        delta_with_official: DirectionalDelta {
            start_to_finish: absolute_delta(official.start_to_finish, start_to_finish),
            finish_to_start: absolute_delta(official.finish_to_start, finish_to_start),
        },
        request_latency: latency,
        trend: None,
        stats: compute_statistics(profile),
        sample_count: profile.len(),
    }
}

/// Trend of `after` relative to `before`, per direction and for the request latency.
pub fn trend_between(before: &DirectionalEstimate, after: &DirectionalEstimate) -> Trend {
    let before_delta = &before.delta_with_official;
    let after_delta = &after.delta_with_official;

    Trend {
        start_to_finish: before_delta
            .start_to_finish
            .zip(after_delta.start_to_finish)
            .map(|(pre, post)| trend_difference(pre, post)),
        finish_to_start: before_delta
            .finish_to_start
            .zip(after_delta.finish_to_start)
            .map(|(pre, post)| trend_difference(pre, post)),
        request_latency_ms: latency_trend(before.request_latency, after.request_latency),
    }
}

impl DirectionalEstimate {
    /// Attaches the trend against `before` to this estimate.
    pub fn with_trend_against(mut self, before: &DirectionalEstimate) -> Self {
        self.trend = Some(trend_between(before, &self));
        self
    }
}

fn absolute_delta(official: Option<f64>, estimated: Option<Minutes>) -> Option<f64> {
    Some((official? - estimated? as f64).abs())
}

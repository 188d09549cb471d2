//! Elevation statistics over profiles, and the accumulator trait shared with the hiking time estimator.

use crate::models::{ElevationStats, Profile, Sample};

/// A single-pass accumulator over the samples of a profile.
pub trait ProfileMetric {
    type Score;
    fn next_sample(&mut self, sample: &Sample);
    fn finish(&mut self) -> Self::Score;
}

/// Feeds every sample of `profile` to `metric` and returns its score.
pub fn score_profile<M: ProfileMetric>(mut metric: M, profile: &Profile) -> M::Score {
    for sample in profile.samples() {
        metric.next_sample(sample);
    }
    metric.finish()
}

/// Elevation gain/loss, extrema and path length of `profile`.
///
/// `up`, `down`, `sum` and `total_distance` are rounded to one decimal, `min` and
/// `max` are left untouched. Single-sample and empty profiles yield zero gain and
/// length.
pub fn compute_statistics(profile: &Profile) -> ElevationStats {
    score_profile(StatisticsMetric::default(), profile)
}

/// Rounds half-way values towards positive infinity.
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub(crate) fn round_tenth(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

#[derive(Debug, Clone, Default)]
struct StatisticsMetric {
    elevation: ElevationMetric,
    path_length: PathLengthMetric,
}

impl ProfileMetric for StatisticsMetric {
    type Score = ElevationStats;

    fn next_sample(&mut self, sample: &Sample) {
        self.elevation.next_sample(sample);
        self.path_length.next_sample(sample);
    }

    fn finish(&mut self) -> ElevationStats {
        let elevation = self.elevation.finish();
        ElevationStats {
            up: round_tenth(elevation.up),
            down: round_tenth(elevation.down),
            min: elevation.min,
            max: elevation.max,
            sum: round_tenth(elevation.up - elevation.down),
            total_distance: round_tenth(self.path_length.finish()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ElevationTotals {
    up: f64,
    down: f64,
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Clone, Default)]
struct ElevationMetric {
    totals: ElevationTotals,
    last_elevation: Option<f64>,
}

impl ProfileMetric for ElevationMetric {
    type Score = ElevationTotals;

    fn next_sample(&mut self, sample: &Sample) {
        let elevation = sample.comb();
        if let Some(last) = self.last_elevation {
            let diff = elevation - last;
            if diff > 0.0 {
                self.totals.up += diff;
            } else {
                self.totals.down += diff.abs();
            }
        }
        self.totals.min = Some(self.totals.min.map_or(elevation, |min| min.min(elevation)));
        self.totals.max = Some(self.totals.max.map_or(elevation, |max| max.max(elevation)));
        self.last_elevation = Some(elevation);
    }

    fn finish(&mut self) -> ElevationTotals {
        self.totals
    }
}

/// Path length blending elevation and planar deltas: `Σ sqrt(dz² + dd²)`.
#[derive(Debug, Clone, Default)]
struct PathLengthMetric {
    total: f64,
    /// `(distance, elevation)` of the previous sample.
    last: Option<(f64, f64)>,
}

impl ProfileMetric for PathLengthMetric {
    type Score = f64;

    fn next_sample(&mut self, sample: &Sample) {
        let elevation = sample.comb();
        if let Some((last_distance, last_elevation)) = self.last {
            let elevation_diff = elevation - last_elevation;
            let distance_diff = sample.distance - last_distance;
            self.total +=
                (elevation_diff * elevation_diff + distance_diff * distance_diff).sqrt();
        }
        self.last = Some((sample.distance, elevation));
    }

    fn finish(&mut self) -> f64 {
        self.total
    }
}

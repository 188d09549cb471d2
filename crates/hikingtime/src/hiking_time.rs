//! Hiking time estimation.
//!
//! Pace follows the SchweizMobil variant of the Swiss hiking formula
//! (<http://www.wandern.ch>): a degree-15 polynomial in the local slope between
//! -40% and +40%, linear outside of it. The slope is expressed in tenths, not in
//! percent. Estimates are compared against fixed official times, so the constants
//! must not be tuned.

use crate::models::{Minutes, Profile, Sample};
use crate::statistics::{ProfileMetric, round_half_up, score_profile};

/// Polynomial coefficients in ascending power order.
const PACE_COEFFICIENTS: [f64; 16] = [
    14.271, 3.6991, 2.5922, -1.4384, 0.32105, 0.81542, -0.090261, -0.20757, 0.010192, 0.028588,
    -0.00057466, -0.0021842, 1.5176e-5, 8.6894e-5, -1.3584e-7, -1.4026e-6,
];

/// Slope (in tenths) beyond which the linear model replaces the polynomial.
const POLYNOMIAL_SLOPE_LIMIT: f64 = 4.0;
const STEEP_ASCENT_FACTOR: f64 = 17.0;
const STEEP_DESCENT_FACTOR: f64 = -9.0;

/// Pace in minutes per kilometer for a slope expressed in tenths (0.1 = 1%).
pub fn pace_minutes_per_km(slope: f64) -> f64 {
    if slope > -POLYNOMIAL_SLOPE_LIMIT && slope < POLYNOMIAL_SLOPE_LIMIT {
        PACE_COEFFICIENTS
            .iter()
            .enumerate()
            .map(|(power, coefficient)| coefficient * slope.powi(power as i32))
            .sum()
    } else if slope > 0.0 {
        STEEP_ASCENT_FACTOR * slope
    } else {
        STEEP_DESCENT_FACTOR * slope
    }
}

/// Estimated hiking time for walking `profile` in sample order, rounded to the minute.
///
/// Returns `None` for an empty profile. Segments with no planar distance contribute
/// nothing.
pub fn estimate(profile: &Profile) -> Option<Minutes> {
    score_profile(HikingTimeMetric::default(), profile)
}

/// Accumulates walking minutes sample after sample.
#[derive(Debug, Clone, Default)]
pub struct HikingTimeMetric {
    minutes: f64,
    samples: usize,
    /// `(distance, elevation)` of the previous sample.
    last: Option<(f64, f64)>,
}

impl ProfileMetric for HikingTimeMetric {
    type Score = Option<Minutes>;

    fn next_sample(&mut self, sample: &Sample) {
        let elevation = sample.comb();
        if let Some((last_distance, last_elevation)) = self.last {
            let distance = sample.distance - last_distance;
            if distance != 0.0 {
                let slope = (elevation - last_elevation) * 10.0 / distance;
                self.minutes += distance * pace_minutes_per_km(slope) / 1000.0;
            }
        }
        self.last = Some((sample.distance, elevation));
        self.samples += 1;
    }

    fn finish(&mut self) -> Option<Minutes> {
        (self.samples > 0).then(|| round_half_up(self.minutes) as Minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::reverse_profile;

    fn profile(points: &[(f64, f64)]) -> Profile {
        Profile::new(points.iter().map(|&(d, e)| Sample::new(d, e)).collect()).unwrap()
    }

    #[test]
    fn test_flat_kilometer() {
        // Slope 0 uses the constant term: 14.271 min/km.
        assert_eq!(estimate(&profile(&[(0.0, 0.0), (1000.0, 0.0)])), Some(14));
    }

    #[test]
    fn test_empty_profile_has_no_estimate() {
        assert_eq!(estimate(&Profile::empty()), None);
    }

    #[test]
    fn test_single_sample_takes_no_time() {
        assert_eq!(estimate(&profile(&[(0.0, 812.0)])), Some(0));
    }

    #[test]
    fn test_zero_distance_segment_is_skipped() {
        let with_repeat = profile(&[(0.0, 0.0), (500.0, 0.0), (500.0, 30.0), (1000.0, 30.0)]);
        let without_repeat = profile(&[(0.0, 0.0), (500.0, 0.0), (1000.0, 0.0)]);
        assert_eq!(estimate(&with_repeat), estimate(&without_repeat));
        assert_eq!(estimate(&with_repeat), Some(14));
    }

    #[test]
    fn test_steep_ascent_is_linear() {
        // 500 m up over 1000 m: slope 5 tenths, 85 min/km.
        assert_eq!(pace_minutes_per_km(5.0), 85.0);
        assert_eq!(estimate(&profile(&[(0.0, 1000.0), (1000.0, 1500.0)])), Some(85));
    }

    #[test]
    fn test_steep_descent_is_linear() {
        assert_eq!(pace_minutes_per_km(-5.0), 45.0);
        assert_eq!(estimate(&profile(&[(0.0, 1500.0), (1000.0, 1000.0)])), Some(45));
    }

    #[test]
    fn test_threshold_uses_linear_branch() {
        assert_eq!(pace_minutes_per_km(4.0), 68.0);
        assert_eq!(pace_minutes_per_km(-4.0), 36.0);
    }

    #[test]
    fn test_uphill_slower_than_downhill() {
        let climb = profile(&[(0.0, 500.0), (2000.0, 700.0)]);
        let up = estimate(&climb).unwrap();
        let down = estimate(&reverse_profile(&climb)).unwrap();
        assert!(up > down, "up {up} should exceed down {down}");
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let p = profile(&[(0.0, 500.0), (120.0, 512.0), (260.0, 498.5), (900.0, 640.0)]);
        let first = estimate(&p);
        for _ in 0..10 {
            assert_eq!(estimate(&p), first);
        }
    }
}

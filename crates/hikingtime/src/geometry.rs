//! Direction handling for profiles and planar measurements of trail geometries.

use geo::{Distance as _, Euclidean, geometry::Point};

use crate::models::{Profile, Sample, TrailGeometry};

/// Returns `profile` walked from finish to start.
///
/// Samples come out in reverse order and every distance is re-based as
/// `total - distance`, `total` being the distance of the last sample of `profile`.
/// The result starts at 0 and stays non-decreasing, so the estimator run on it gives
/// the return trip.
pub fn reverse_profile(profile: &Profile) -> Profile {
    let Some(total) = profile.total_distance() else {
        return Profile::empty();
    };

    let samples: Vec<Sample> = profile
        .samples()
        .iter()
        .rev()
        .map(|sample| Sample {
            distance: total - sample.distance,
            ..sample.clone()
        })
        .collect();

    Profile::from_validated(samples)
}

impl TrailGeometry {
    /// Vertices of the line as planar points (the first two ordinates of each position).
    pub fn points(&self) -> Vec<Point> {
        match self {
            TrailGeometry::LineString { coordinates } => coordinates
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| Point::new(c[0], c[1]))
                .collect(),
        }
    }

    /// Planar length of the line, in the units of its projection (meters for LV95).
    pub fn planar_length(&self) -> f64 {
        self.points()
            .windows(2)
            .map(|w| Euclidean.distance(w[0], w[1]))
            .sum()
    }
}

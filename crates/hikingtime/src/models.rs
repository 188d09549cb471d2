use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ProfileError;

/// Identifier of the combined elevation model, the only model read by the calculations.
pub const COMB: &str = "COMB";

/// Estimated hiking durations are whole minutes.
pub type Minutes = i64;

/// One point of an elevation profile, as served by the profile service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Cumulative planar distance from the start of the trail, in meters.
    #[serde(rename = "dist")]
    pub distance: f64,
    /// Elevation per elevation model identifier.
    #[serde(rename = "alts")]
    pub elevation_by_model: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easting: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub northing: Option<f64>,
}

impl Sample {
    /// Creates a sample carrying only a `COMB` elevation.
    pub fn new(distance: f64, elevation: f64) -> Self {
        Self {
            distance,
            elevation_by_model: BTreeMap::from([(COMB.to_string(), elevation)]),
            easting: None,
            northing: None,
        }
    }

    pub fn elevation(&self, model: &str) -> Option<f64> {
        self.elevation_by_model.get(model).copied()
    }

    /// `COMB` elevation. Presence is checked when the owning [`Profile`] is built.
    pub(crate) fn comb(&self) -> f64 {
        self.elevation(COMB).unwrap_or(f64::NAN)
    }
}

/// An ordered, validated sequence of [`Sample`]s.
///
/// A profile never changes once built; [`reverse_profile`](crate::geometry::reverse_profile)
/// produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Sample>", into = "Vec<Sample>")]
pub struct Profile {
    samples: Vec<Sample>,
}

impl Profile {
    /// Validates `samples` and wraps them into a profile.
    ///
    /// An empty sequence is accepted. Otherwise every sample needs a non-negative,
    /// non-decreasing distance and the same set of elevation models as the first
    /// sample, which must include `COMB`.
    pub fn new(samples: Vec<Sample>) -> Result<Self, ProfileError> {
        let mut previous: Option<f64> = None;

        for (index, sample) in samples.iter().enumerate() {
            if sample.elevation(COMB).is_none() {
                return Err(ProfileError::MissingElevationModel {
                    index,
                    model: COMB.to_string(),
                });
            }
            if !sample.elevation_by_model.keys().eq(samples[0].elevation_by_model.keys()) {
                return Err(ProfileError::InconsistentModels { index });
            }
            if sample.distance.is_nan() || sample.distance < 0.0 {
                return Err(ProfileError::NegativeDistance {
                    index,
                    distance: sample.distance,
                });
            }
            if let Some(previous) = previous
                && sample.distance < previous
            {
                return Err(ProfileError::DecreasingDistance {
                    index,
                    distance: sample.distance,
                    previous,
                });
            }
            previous = Some(sample.distance);
        }

        Ok(Self { samples })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps samples whose invariants the caller already upholds.
    pub(crate) fn from_validated(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Distance of the last sample, i.e. the planar length covered by the profile.
    pub fn total_distance(&self) -> Option<f64> {
        self.samples.last().map(|s| s.distance)
    }

    /// Consecutive `(previous, current)` sample pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&Sample, &Sample)> {
        self.samples.windows(2).map(|w| (&w[0], &w[1]))
    }
}

impl TryFrom<Vec<Sample>> for Profile {
    type Error = ProfileError;

    fn try_from(samples: Vec<Sample>) -> Result<Self, Self::Error> {
        Self::new(samples)
    }
}

impl From<Profile> for Vec<Sample> {
    fn from(profile: Profile) -> Self {
        profile.samples
    }
}

/// Trail geometry submitted to the profile service, as GeoJSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TrailGeometry {
    LineString { coordinates: Vec<Vec<f64>> },
}

/// Official reference durations in minutes. Treated as ground truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OfficialTime {
    pub start_to_finish: Option<f64>,
    pub finish_to_start: Option<f64>,
}

impl OfficialTime {
    pub fn new(start_to_finish: f64, finish_to_start: f64) -> Self {
        Self {
            start_to_finish: Some(start_to_finish),
            finish_to_start: Some(finish_to_start),
        }
    }
}

/// Trail figures recorded in the metadata store alongside the official times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStats {
    pub elevation_up: Option<f64>,
    pub elevation_down: Option<f64>,
    pub elevation_min: Option<f64>,
    pub elevation_max: Option<f64>,
    pub total_distance: Option<f64>,
    /// Length of the trail geometry as recorded by the metadata export.
    pub geometry_length: Option<f64>,
    /// Length of the trail geometry as computed from its coordinates.
    pub planar_length: Option<f64>,
}

/// Elevation statistics derived from a single profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElevationStats {
    pub up: f64,
    pub down: f64,
    /// `None` only for an empty profile.
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// `up - down`.
    pub sum: f64,
    /// Accumulated `sqrt(dElevation² + dDistance²)` along the profile.
    pub total_distance: f64,
}

/// Per-direction absolute error against the official time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionalDelta {
    pub start_to_finish: Option<f64>,
    pub finish_to_start: Option<f64>,
}

/// Change of the estimation error between the "before" and the "after" source.
///
/// Negative values mean the error shrank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub start_to_finish: Option<f64>,
    pub finish_to_start: Option<f64>,
    /// `after.request_latency - before.request_latency`, in milliseconds.
    pub request_latency_ms: f64,
}

/// Hiking time estimates computed from one profile source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalEstimate {
    pub start_to_finish: Option<Minutes>,
    pub finish_to_start: Option<Minutes>,
    pub delta_with_official: DirectionalDelta,
    #[serde(rename = "request_latency_ms", with = "duration_ms")]
    pub request_latency: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    pub stats: ElevationStats,
    pub sample_count: usize,
}

/// The unit of work of a reconciliation run, and its output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailRecord {
    pub id: i64,
    pub name: String,
    pub geometry: TrailGeometry,
    pub official: OfficialTime,
    #[serde(default)]
    pub reference: ReferenceStats,
    #[serde(default)]
    pub before: Option<DirectionalEstimate>,
    #[serde(default)]
    pub after: Option<DirectionalEstimate>,
}

impl TrailRecord {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        geometry: TrailGeometry,
        official: OfficialTime,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            geometry,
            official,
            reference: ReferenceStats::default(),
            before: None,
            after: None,
        }
    }

    pub fn with_reference(mut self, reference: ReferenceStats) -> Self {
        self.reference = reference;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(millis.max(0.0) / 1000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_accepts_repeated_distance() {
        let profile = Profile::new(vec![
            Sample::new(0.0, 500.0),
            Sample::new(10.0, 505.0),
            Sample::new(10.0, 506.0),
        ]);
        assert!(profile.is_ok());
    }

    #[test]
    fn test_profile_rejects_decreasing_distance() {
        let err = Profile::new(vec![
            Sample::new(0.0, 500.0),
            Sample::new(20.0, 505.0),
            Sample::new(15.0, 506.0),
        ])
        .unwrap_err();
        assert!(matches!(err, ProfileError::DecreasingDistance { index: 2, .. }));
    }

    #[test]
    fn test_profile_rejects_missing_comb() {
        let mut sample = Sample::new(0.0, 500.0);
        sample.elevation_by_model = BTreeMap::from([("DTM25".to_string(), 500.0)]);
        let err = Profile::new(vec![sample]).unwrap_err();
        assert!(matches!(err, ProfileError::MissingElevationModel { index: 0, .. }));
    }

    #[test]
    fn test_profile_rejects_inconsistent_models() {
        let mut second = Sample::new(10.0, 501.0);
        second.elevation_by_model.insert("DTM2".to_string(), 502.0);
        let err = Profile::new(vec![Sample::new(0.0, 500.0), second]).unwrap_err();
        assert_eq!(err, ProfileError::InconsistentModels { index: 1 });
    }

    #[test]
    fn test_profile_deserializes_service_payload() {
        let json = r#"[
            {"dist": 0.0, "alts": {"COMB": 1020.5}, "easting": 2600000.0, "northing": 1200000.0},
            {"dist": 12.5, "alts": {"COMB": 1021.0}, "easting": 2600010.0, "northing": 1200007.5}
        ]"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.len(), 2);
        assert_eq!(profile.total_distance(), Some(12.5));
        assert_eq!(profile.samples()[1].elevation(COMB), Some(1021.0));
    }

    #[test]
    fn test_profile_deserialization_validates() {
        let json = r#"[{"dist": 5.0, "alts": {"COMB": 1.0}}, {"dist": 1.0, "alts": {"COMB": 1.0}}]"#;
        assert!(serde_json::from_str::<Profile>(json).is_err());
    }

    #[test]
    fn test_request_latency_serialized_as_millis() {
        let estimate = DirectionalEstimate {
            start_to_finish: Some(60),
            finish_to_start: Some(55),
            delta_with_official: DirectionalDelta::default(),
            request_latency: Duration::from_millis(250),
            trend: None,
            stats: ElevationStats::default(),
            sample_count: 2,
        };
        let value = serde_json::to_value(&estimate).unwrap();
        assert_eq!(value["request_latency_ms"], 250.0);
        assert!(value.get("trend").is_none());
    }
}

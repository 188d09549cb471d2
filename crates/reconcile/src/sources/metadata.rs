//! Trail metadata loading.

use std::path::{Path, PathBuf};

use hikingtime::{OfficialTime, ReferenceStats, TrailGeometry, TrailRecord};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No features found in {0}")]
    NoFeatures(PathBuf),
    #[error("Unsupported geometry in {path}: {source}")]
    UnsupportedGeometry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One entry of the metadata export, with the export's field names.
#[derive(Debug, Deserialize)]
struct RawTrailMetadata {
    #[serde(rename = "OBJECTID")]
    id: i64,
    #[serde(rename = "NameE")]
    name: String,
    geojson_file: String,
    #[serde(rename = "officialStZie")]
    official_start_to_finish: Option<f64>,
    #[serde(rename = "officialZieSt")]
    official_finish_to_start: Option<f64>,
    #[serde(rename = "HoeheAufE")]
    elevation_up: Option<f64>,
    #[serde(rename = "HoeheAbE")]
    elevation_down: Option<f64>,
    #[serde(rename = "HoeheMinE")]
    elevation_min: Option<f64>,
    #[serde(rename = "HoeheMaxE")]
    elevation_max: Option<f64>,
    #[serde(rename = "LaengeE")]
    total_distance: Option<f64>,
    #[serde(rename = "SHAPE_Leng")]
    geometry_length: Option<f64>,
}

impl RawTrailMetadata {
    fn into_record(self, geometry: TrailGeometry) -> TrailRecord {
        let official = OfficialTime {
            start_to_finish: self.official_start_to_finish,
            finish_to_start: self.official_finish_to_start,
        };
        let reference = ReferenceStats {
            elevation_up: self.elevation_up,
            elevation_down: self.elevation_down,
            elevation_min: self.elevation_min,
            elevation_max: self.elevation_max,
            total_distance: self.total_distance,
            geometry_length: self.geometry_length,
            planar_length: Some(geometry.planar_length()),
        };
        TrailRecord::new(self.id, self.name, geometry, official).with_reference(reference)
    }
}

/// Trail geometries are exported as a FeatureCollection wrapping a single LineString.
#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: serde_json::Value,
}

/// Reads trail seeds (name, official times, geometry) from a data folder.
pub struct MetadataStore {
    data_dir: PathBuf,
}

impl MetadataStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Loads every trail listed in `metadata_file`, in file order.
    ///
    /// A trail whose geometry file cannot be read is logged and left out; a broken
    /// metadata file fails the whole load.
    pub fn load(&self, metadata_file: &str) -> Result<Vec<TrailRecord>, MetadataError> {
        let entries: Vec<RawTrailMetadata> = read_json(&self.data_dir.join(metadata_file))?;
        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            match self.load_geometry(&entry.geojson_file) {
                Ok(geometry) => records.push(entry.into_record(geometry)),
                Err(e) => warn!("Skipping trail \"{}\": {e}", entry.name),
            }
        }

        debug!("Loaded {} trails from {}", records.len(), metadata_file);
        Ok(records)
    }

    /// Reads `{geojson_file}.lv95.json` and unwraps the geometry of its first feature.
    pub fn load_geometry(&self, geojson_file: &str) -> Result<TrailGeometry, MetadataError> {
        let path = self.data_dir.join(format!("{geojson_file}.lv95.json"));
        let collection: FeatureCollection = read_json(&path)?;
        let feature = collection
            .features
            .into_iter()
            .next()
            .ok_or_else(|| MetadataError::NoFeatures(path.clone()))?;

        serde_json::from_value(feature.geometry)
            .map_err(|source| MetadataError::UnsupportedGeometry { path, source })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, MetadataError> {
    let contents = std::fs::read_to_string(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| MetadataError::Json {
        path: path.to_path_buf(),
        source,
    })
}

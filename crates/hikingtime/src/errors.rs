use thiserror::Error;

/// Reasons a sequence of samples is rejected as a [`Profile`](crate::models::Profile).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Sample {index} has no elevation for model {model}")]
    MissingElevationModel { index: usize, model: String },

    #[error("Sample {index} has a negative distance ({distance})")]
    NegativeDistance { index: usize, distance: f64 },

    #[error("Sample {index} distance {distance} is smaller than the previous one ({previous})")]
    DecreasingDistance {
        index: usize,
        distance: f64,
        previous: f64,
    },

    #[error("Sample {index} does not carry the same elevation models as the first sample")]
    InconsistentModels { index: usize },
}

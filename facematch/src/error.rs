use thiserror::Error;

/// Errors returned by face matching operations.
#[derive(Debug, Error)]
pub enum FaceMatchError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("face region {0:?} lies outside the image")]
    RegionOutOfBounds([f32; 4]),

    #[error("detector error: {0}")]
    Detector(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

use serde::{Deserialize, Serialize};

use crate::FaceMatchError;

/// Thresholds for face filtering and matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceMatchConfig {
    /// Minimum detector score for a face to be compared (default: 0.5).
    pub face_confidence: f32,
    /// Faces must be strictly wider and taller than this, in pixels (default: 50).
    pub min_face_size: f32,
    /// Similarity at which two faces are the same person (default: 0.4).
    pub similarity_threshold: f64,
    /// Similarity for a high-confidence match (default: 0.6).
    pub high_confidence_threshold: f64,
    /// Non-matching similarities above this are LOW rather than VERY_LOW
    /// (default: 0.2).
    pub low_similarity_floor: f64,
    /// Detection score assigned to fallback faces (default: 0.8).
    pub fallback_det_score: f32,
}

impl Default for FaceMatchConfig {
    fn default() -> Self {
        Self {
            face_confidence: 0.5,
            min_face_size: 50.0,
            similarity_threshold: 0.4,
            high_confidence_threshold: 0.6,
            low_similarity_floor: 0.2,
            fallback_det_score: 0.8,
        }
    }
}

impl FaceMatchConfig {
    /// Checks that the similarity thresholds are ordered within `[-1, 1]`.
    pub fn validate(&self) -> Result<(), FaceMatchError> {
        let (lo, mid, hi) = (
            self.low_similarity_floor,
            self.similarity_threshold,
            self.high_confidence_threshold,
        );
        if !(-1.0..=1.0).contains(&lo) || !(-1.0..=1.0).contains(&hi) {
            return Err(FaceMatchError::InvalidConfig(format!(
                "similarity thresholds must lie in [-1, 1], got {lo} and {hi}"
            )));
        }
        if !(lo <= mid && mid <= hi) {
            return Err(FaceMatchError::InvalidConfig(format!(
                "expected low floor <= similarity <= high confidence, got {lo}, {mid}, {hi}"
            )));
        }
        if !(0.0..=1.0).contains(&self.face_confidence) {
            return Err(FaceMatchError::InvalidConfig(format!(
                "face_confidence {} outside [0, 1]",
                self.face_confidence
            )));
        }
        if !(self.min_face_size >= 0.0) {
            return Err(FaceMatchError::InvalidConfig(format!(
                "min_face_size {} must be non-negative",
                self.min_face_size
            )));
        }
        Ok(())
    }
}

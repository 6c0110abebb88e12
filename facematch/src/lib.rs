//! Face verification over detected faces.
//!
//! Detection is injected: a [`FaceDetector`] yields faces with learned
//! embeddings, while a [`FallbackDetector`] only yields boxes and each box
//! gets a grayscale histogram embedding. Both paths produce the same
//! [`DetectedFace`] record, tagged by [`DetectionSource`].
//!
//! ```text
//! detections -> filter (score >= 0.5, size > 50px)
//!            -> single: best face per side, cosine tiers
//!               multi:  greedy pairing at similarity >= 0.4
//!            -> FaceOutcome
//! ```

mod config;
mod error;
mod face;
mod image;
mod matcher;

pub use config::FaceMatchConfig;
pub use error::FaceMatchError;
pub use face::{
    faces_from_boxes, histogram_embedding, BoundingBox, DetectedFace, DetectionSource,
    FaceDetector, FallbackDetector, FALLBACK_EMBEDDING_DIM, FALLBACK_FACE_SIZE,
};
pub use image::GrayImage;
pub use matcher::{
    Comparison, ConfidenceLevel, FaceMatcher, FaceOutcome, FacePair, FaceVerdict,
    MultiComparison, SingleComparison,
};

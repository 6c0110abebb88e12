use serde::{Deserialize, Serialize};

use crate::image::GrayImage;
use crate::FaceMatchError;

/// Side length of the square the fallback embedding is computed on.
pub const FALLBACK_FACE_SIZE: usize = 128;

/// Number of grayscale histogram bins in the fallback embedding.
pub const FALLBACK_EMBEDDING_DIM: usize = 256;

/// Axis-aligned face box in pixel coordinates. Serialized as
/// `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box from a top-left corner and a size.
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(b: [f32; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Which detection path produced a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    #[default]
    Primary,
    Fallback,
}

/// A detected face with its identity embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFace {
    pub bbox: BoundingBox,
    pub det_score: f32,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub source: DetectionSource,
}

impl DetectedFace {
    pub fn new(bbox: BoundingBox, det_score: f32, embedding: Vec<f32>) -> Self {
        Self {
            bbox,
            det_score,
            embedding,
            source: DetectionSource::Primary,
        }
    }
}

/// Detector producing faces with learned embeddings.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Result<Vec<DetectedFace>, FaceMatchError>;
}

/// Detector that only locates faces. Embeddings for its boxes come from
/// [`histogram_embedding`].
pub trait FallbackDetector: Send + Sync {
    fn locate(&self, image: &GrayImage) -> Result<Vec<BoundingBox>, FaceMatchError>;
}

/// Grayscale histogram of the face region resized to 128x128, L2
/// normalized.
pub fn histogram_embedding(
    image: &GrayImage,
    bbox: &BoundingBox,
) -> Result<Vec<f32>, FaceMatchError> {
    let clamp = |v: f32, hi: usize| (v.max(0.0) as usize).min(hi);
    let x1 = clamp(bbox.x1.floor(), image.width());
    let y1 = clamp(bbox.y1.floor(), image.height());
    let x2 = clamp(bbox.x2.ceil(), image.width());
    let y2 = clamp(bbox.y2.ceil(), image.height());
    if x2 <= x1 || y2 <= y1 {
        return Err(FaceMatchError::RegionOutOfBounds((*bbox).into()));
    }

    let face = image
        .crop(x1, y1, x2 - x1, y2 - y1)?
        .resize_nearest(FALLBACK_FACE_SIZE, FALLBACK_FACE_SIZE)?;

    let mut hist = vec![0.0f32; FALLBACK_EMBEDDING_DIM];
    for &p in face.pixels() {
        hist[p as usize] += 1.0;
    }
    let norm = hist.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut hist {
            *v /= norm;
        }
    }
    Ok(hist)
}

/// Turns fallback boxes into faces with a fixed detection score.
pub fn faces_from_boxes(
    image: &GrayImage,
    boxes: &[BoundingBox],
    det_score: f32,
) -> Result<Vec<DetectedFace>, FaceMatchError> {
    boxes
        .iter()
        .map(|bbox| {
            Ok(DetectedFace {
                bbox: *bbox,
                det_score,
                embedding: histogram_embedding(image, bbox)?,
                source: DetectionSource::Fallback,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_geometry() {
        let b = BoundingBox::from_xywh(10.0, 20.0, 60.0, 80.0);
        assert_eq!(b.width(), 60.0);
        assert_eq!(b.height(), 80.0);
        assert_eq!(b.area(), 4800.0);
    }

    #[test]
    fn bbox_serializes_as_array() {
        let b = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");
        let back: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn face_source_defaults_to_primary() {
        let face: DetectedFace =
            serde_json::from_str(r#"{"bbox":[0,0,60,60],"detScore":0.9,"embedding":[1.0,0.0]}"#)
                .unwrap();
        assert_eq!(face.source, DetectionSource::Primary);
        assert_eq!(face.det_score, 0.9);
    }

    #[test]
    fn histogram_of_flat_region() {
        let img = GrayImage::new(100, 100, vec![7; 100 * 100]).unwrap();
        let emb = histogram_embedding(&img, &BoundingBox::new(10.0, 10.0, 70.0, 70.0)).unwrap();
        assert_eq!(emb.len(), FALLBACK_EMBEDDING_DIM);
        assert!((emb[7] - 1.0).abs() < 1e-6);
        assert_eq!(emb.iter().filter(|v| **v > 0.0).count(), 1);
    }

    #[test]
    fn histogram_is_unit_norm() {
        let pixels = (0..80 * 80).map(|i| (i * 31 % 256) as u8).collect();
        let img = GrayImage::new(80, 80, pixels).unwrap();
        let emb = histogram_embedding(&img, &BoundingBox::new(0.0, 0.0, 80.0, 80.0)).unwrap();
        let norm = emb.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn histogram_clamps_to_image() {
        let img = GrayImage::new(64, 64, vec![200; 64 * 64]).unwrap();
        let emb = histogram_embedding(&img, &BoundingBox::new(-5.0, -5.0, 90.0, 90.0)).unwrap();
        assert!((emb[200] - 1.0).abs() < 1e-6);
        assert!(histogram_embedding(&img, &BoundingBox::new(70.0, 70.0, 90.0, 90.0)).is_err());
    }

    #[test]
    fn fallback_faces_are_tagged() {
        let img = GrayImage::new(64, 64, vec![3; 64 * 64]).unwrap();
        let faces = faces_from_boxes(&img, &[BoundingBox::new(0.0, 0.0, 60.0, 60.0)], 0.8).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].source, DetectionSource::Fallback);
        assert_eq!(faces[0].det_score, 0.8);
    }
}

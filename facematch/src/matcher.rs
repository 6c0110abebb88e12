use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use vouch_ensemble::similarity::{cosine_similarity, euclidean_distance, widen};

use crate::config::FaceMatchConfig;
use crate::face::{
    faces_from_boxes, BoundingBox, DetectedFace, DetectionSource, FaceDetector, FallbackDetector,
};
use crate::image::GrayImage;
use crate::FaceMatchError;

/// Confidence tier of a face comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    High,
    Moderate,
    Low,
    VeryLow,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "HIGH",
            Self::Moderate => "MODERATE",
            Self::Low => "LOW",
            Self::VeryLow => "VERY_LOW",
        })
    }
}

impl ConfidenceLevel {
    /// Human-readable verdict for a single comparison at this tier.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "SAME PERSON (High Confidence)",
            Self::Moderate => "SAME PERSON (Moderate Confidence)",
            Self::Low | Self::VeryLow => "DIFFERENT PERSONS",
        }
    }
}

/// Best-face comparison when each side has at most one face.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleComparison {
    pub cosine_similarity: f64,
    pub euclidean_distance: Option<f64>,
    pub confidence_level: ConfidenceLevel,
    pub result: &'static str,
    pub stored_det_score: f32,
    pub probe_det_score: f32,
    pub stored_bbox: BoundingBox,
    pub probe_bbox: BoundingBox,
    pub probe_source: DetectionSource,
}

/// One greedy pairing between a stored face and a probe face.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacePair {
    pub stored_face: usize,
    pub probe_face: usize,
    pub cosine_similarity: f64,
    pub result: &'static str,
    pub probe_bbox: BoundingBox,
    pub probe_source: DetectionSource,
}

/// Greedy pairing when either side has several faces.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiComparison {
    pub matches: Vec<FacePair>,
    pub unmatched_stored: Vec<usize>,
    pub unmatched_probe: Vec<usize>,
}

impl MultiComparison {
    /// The pairing with the highest similarity.
    pub fn best_match(&self) -> Option<&FacePair> {
        self.matches
            .iter()
            .max_by(|a, b| a.cosine_similarity.total_cmp(&b.cosine_similarity))
    }
}

/// Raw result of comparing two face sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Comparison {
    Single(SingleComparison),
    Multi(MultiComparison),
    NoFace { details: String },
}

/// Collapsed face verification decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceVerdict {
    pub verified: bool,
    /// Cosine similarity rounded to three decimals.
    pub similarity: f64,
    pub confidence: ConfidenceLevel,
    pub result: &'static str,
    pub details: String,
    /// Box of the matched probe face, for tracking.
    pub probe_bbox: Option<BoundingBox>,
    pub source: Option<DetectionSource>,
}

/// Outcome of [`FaceMatcher::verify_faces`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FaceOutcome {
    NoFaceDetected { details: String },
    Verdict(FaceVerdict),
}

impl FaceOutcome {
    pub fn verdict(&self) -> Option<&FaceVerdict> {
        match self {
            Self::Verdict(v) => Some(v),
            Self::NoFaceDetected { .. } => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verdict().is_some_and(|v| v.verified)
    }
}

/// Compares detected faces and optionally runs detection itself.
pub struct FaceMatcher {
    config: FaceMatchConfig,
    primary: Option<Arc<dyn FaceDetector>>,
    fallback: Option<Arc<dyn FallbackDetector>>,
}

impl Default for FaceMatcher {
    fn default() -> Self {
        Self {
            config: FaceMatchConfig::default(),
            primary: None,
            fallback: None,
        }
    }
}

impl FaceMatcher {
    pub fn new(config: FaceMatchConfig) -> Result<Self, FaceMatchError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Default::default()
        })
    }

    /// Sets the detector that produces learned embeddings.
    pub fn with_detector(mut self, detector: Arc<dyn FaceDetector>) -> Self {
        self.primary = Some(detector);
        self
    }

    /// Sets the box-only detector used when no primary detector is set.
    pub fn with_fallback(mut self, detector: Arc<dyn FallbackDetector>) -> Self {
        self.fallback = Some(detector);
        self
    }

    pub fn config(&self) -> &FaceMatchConfig {
        &self.config
    }

    /// Keeps faces with enough detector confidence and size.
    pub fn filter_faces(&self, faces: &[DetectedFace]) -> Vec<DetectedFace> {
        let cfg = &self.config;
        faces
            .iter()
            .enumerate()
            .filter(|(i, f)| {
                let (w, h) = (f.bbox.width(), f.bbox.height());
                let keep =
                    f.det_score >= cfg.face_confidence && w > cfg.min_face_size && h > cfg.min_face_size;
                debug!(
                    face = i,
                    score = f.det_score,
                    width = w,
                    height = h,
                    keep,
                    "face quality check"
                );
                keep
            })
            .map(|(_, f)| f.clone())
            .collect()
    }

    /// Face with the highest detector score, ties broken by area.
    pub fn select_best_face<'a>(&self, faces: &'a [DetectedFace]) -> Option<&'a DetectedFace> {
        faces.iter().max_by(|a, b| {
            match a.det_score.total_cmp(&b.det_score) {
                Ordering::Equal => a.bbox.area().total_cmp(&b.bbox.area()),
                o => o,
            }
        })
    }

    /// Cosine similarity of two embeddings; degenerate pairs score 0.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f64 {
        match cosine_similarity(&widen(a), &widen(b)) {
            Some(s) => s,
            None => {
                debug!(dims = ?(a.len(), b.len()), "degenerate face embeddings");
                0.0
            }
        }
    }

    pub fn confidence_level(&self, similarity: f64) -> ConfidenceLevel {
        let cfg = &self.config;
        if similarity >= cfg.high_confidence_threshold {
            ConfidenceLevel::High
        } else if similarity >= cfg.similarity_threshold {
            ConfidenceLevel::Moderate
        } else if similarity > cfg.low_similarity_floor {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    /// Compares the best face of each side.
    pub fn compare_single(&self, stored: &DetectedFace, probe: &DetectedFace) -> SingleComparison {
        let sim = self.similarity(&stored.embedding, &probe.embedding);
        let dist = euclidean_distance(&widen(&stored.embedding), &widen(&probe.embedding));
        let level = self.confidence_level(sim);
        SingleComparison {
            cosine_similarity: sim,
            euclidean_distance: dist,
            confidence_level: level,
            result: level.label(),
            stored_det_score: stored.det_score,
            probe_det_score: probe.det_score,
            stored_bbox: stored.bbox,
            probe_bbox: probe.bbox,
            probe_source: probe.source,
        }
    }

    /// Greedy pairing: each stored face takes the most similar unused probe
    /// face at or above the similarity threshold.
    pub fn compare_multi(&self, stored: &[DetectedFace], probe: &[DetectedFace]) -> MultiComparison {
        let mut out = MultiComparison::default();
        let mut used = vec![false; probe.len()];

        for (i, f1) in stored.iter().enumerate() {
            let mut best: Option<(usize, f64)> = None;
            let mut best_score = 0.0;
            for (j, f2) in probe.iter().enumerate() {
                if used[j] {
                    continue;
                }
                let sim = self.similarity(&f1.embedding, &f2.embedding);
                if sim > best_score && sim >= self.config.similarity_threshold {
                    best_score = sim;
                    best = Some((j, sim));
                }
            }
            match best {
                Some((j, sim)) => {
                    used[j] = true;
                    out.matches.push(FacePair {
                        stored_face: i,
                        probe_face: j,
                        cosine_similarity: sim,
                        result: if sim >= self.config.high_confidence_threshold {
                            "SAME PERSON"
                        } else {
                            "Possible Match"
                        },
                        probe_bbox: probe[j].bbox,
                        probe_source: probe[j].source,
                    });
                }
                None => out.unmatched_stored.push(i),
            }
        }
        out.unmatched_probe = (0..probe.len()).filter(|&j| !used[j]).collect();
        out
    }

    /// Compares two already-filtered face sets.
    pub fn compare(&self, stored: &[DetectedFace], probe: &[DetectedFace]) -> Comparison {
        info!(stored = stored.len(), probe = probe.len(), "comparing faces");
        if stored.len() > 1 || probe.len() > 1 {
            return Comparison::Multi(self.compare_multi(stored, probe));
        }
        match (self.select_best_face(stored), self.select_best_face(probe)) {
            (Some(a), Some(b)) => Comparison::Single(self.compare_single(a, b)),
            (None, _) => Comparison::NoFace {
                details: "No face detected in image 1".into(),
            },
            (_, None) => Comparison::NoFace {
                details: "No face detected in image 2".into(),
            },
        }
    }

    /// Filters both detections, compares them and collapses the result into
    /// a single verdict.
    pub fn verify_faces(&self, stored: &[DetectedFace], probe: &[DetectedFace]) -> FaceOutcome {
        let stored = self.filter_faces(stored);
        let probe = self.filter_faces(probe);
        let threshold = self.config.similarity_threshold;

        let (similarity, confidence, result, probe_bbox, source) =
            match self.compare(&stored, &probe) {
                Comparison::NoFace { details } => {
                    info!(%details, "face verification without faces");
                    return FaceOutcome::NoFaceDetected { details };
                }
                Comparison::Single(c) => (
                    c.cosine_similarity,
                    c.confidence_level,
                    c.result,
                    Some(c.probe_bbox),
                    Some(c.probe_source),
                ),
                Comparison::Multi(m) => match m.best_match() {
                    Some(best) => {
                        let level = self.confidence_level(best.cosine_similarity);
                        (
                            best.cosine_similarity,
                            level,
                            level.label(),
                            Some(best.probe_bbox),
                            Some(best.probe_source),
                        )
                    }
                    None => (
                        0.0,
                        ConfidenceLevel::Low,
                        ConfidenceLevel::Low.label(),
                        None,
                        None,
                    ),
                },
            };

        let verified = similarity >= threshold;
        info!(verified, similarity, %confidence, result, "face verification complete");
        FaceOutcome::Verdict(FaceVerdict {
            verified,
            similarity: (similarity * 1000.0).round() / 1000.0,
            confidence,
            result,
            details: format!("cosine similarity {similarity:.3}, threshold {threshold}"),
            probe_bbox,
            source,
        })
    }

    /// Runs the configured detector on an image. Without a primary detector
    /// the fallback boxes get histogram embeddings.
    pub fn detect(&self, image: &GrayImage) -> Result<Vec<DetectedFace>, FaceMatchError> {
        let faces = match (&self.primary, &self.fallback) {
            (Some(primary), _) => primary.detect(image)?,
            (None, Some(fallback)) => {
                info!("using fallback face detection");
                let boxes = fallback.locate(image)?;
                faces_from_boxes(image, &boxes, self.config.fallback_det_score)?
            }
            (None, None) => {
                return Err(FaceMatchError::Detector("no face detector configured".into()));
            }
        };
        debug!(faces = faces.len(), "raw face detections");
        Ok(faces)
    }

    /// Detects faces in both images and verifies them.
    pub fn detect_and_verify(
        &self,
        stored: &GrayImage,
        probe: &GrayImage,
    ) -> Result<FaceOutcome, FaceMatchError> {
        let a = self.detect(stored)?;
        let b = self.detect(probe)?;
        Ok(self.verify_faces(&a, &b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x: f32, score: f32, size: f32, embedding: Vec<f32>) -> DetectedFace {
        DetectedFace::new(BoundingBox::from_xywh(x, 0.0, size, size), score, embedding)
    }

    #[test]
    fn filter_drops_small_and_unsure_faces() {
        let m = FaceMatcher::default();
        let faces = vec![
            face(0.0, 0.9, 80.0, vec![1.0]),
            face(0.0, 0.4, 80.0, vec![1.0]),
            face(0.0, 0.9, 50.0, vec![1.0]),
            face(0.0, 0.5, 51.0, vec![1.0]),
        ];
        let kept = m.filter_faces(&faces);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].det_score, 0.5);
    }

    #[test]
    fn best_face_prefers_score_then_area() {
        let m = FaceMatcher::default();
        let faces = vec![
            face(0.0, 0.8, 100.0, vec![1.0]),
            face(1.0, 0.9, 60.0, vec![1.0]),
            face(2.0, 0.9, 70.0, vec![1.0]),
        ];
        let best = m.select_best_face(&faces).unwrap();
        assert_eq!(best.bbox.x1, 2.0);
        assert!(m.select_best_face(&[]).is_none());
    }

    #[test]
    fn confidence_tiers() {
        let m = FaceMatcher::default();
        assert_eq!(m.confidence_level(0.6), ConfidenceLevel::High);
        assert_eq!(m.confidence_level(0.45), ConfidenceLevel::Moderate);
        assert_eq!(m.confidence_level(0.3), ConfidenceLevel::Low);
        assert_eq!(m.confidence_level(0.2), ConfidenceLevel::VeryLow);
        assert_eq!(ConfidenceLevel::VeryLow.to_string(), "VERY_LOW");
    }

    #[test]
    fn single_comparison_distances() {
        let m = FaceMatcher::default();
        let c = m.compare_single(
            &face(0.0, 0.9, 80.0, vec![1.0, 0.0]),
            &face(0.0, 0.9, 80.0, vec![0.0, 1.0]),
        );
        assert!(c.cosine_similarity.abs() < 1e-12);
        assert!((c.euclidean_distance.unwrap() - 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(c.result, "DIFFERENT PERSONS");
        assert_eq!(c.confidence_level, ConfidenceLevel::VeryLow);
    }

    #[test]
    fn zero_embedding_scores_zero() {
        let m = FaceMatcher::default();
        assert_eq!(m.similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(m.similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn greedy_multi_matching() {
        let m = FaceMatcher::default();
        let stored = vec![
            face(0.0, 0.9, 80.0, vec![1.0, 0.0, 0.0]),
            face(100.0, 0.9, 80.0, vec![0.0, 1.0, 0.0]),
            face(200.0, 0.9, 80.0, vec![0.0, 0.0, 1.0]),
        ];
        let probe = vec![
            face(0.0, 0.9, 80.0, vec![0.0, 1.0, 0.1]),
            face(100.0, 0.9, 80.0, vec![1.0, 0.5, 0.0]),
        ];
        let r = m.compare_multi(&stored, &probe);
        assert_eq!(r.matches.len(), 2);
        assert_eq!((r.matches[0].stored_face, r.matches[0].probe_face), (0, 1));
        assert_eq!(r.matches[0].result, "SAME PERSON");
        assert_eq!((r.matches[1].stored_face, r.matches[1].probe_face), (1, 0));
        assert_eq!(r.unmatched_stored, vec![2]);
        assert!(r.unmatched_probe.is_empty());
        assert_eq!(r.best_match().unwrap().probe_face, 0);
    }

    #[test]
    fn multi_possible_match_label() {
        let m = FaceMatcher::default();
        // cos = 0.5: above 0.4, below 0.6.
        let stored = vec![face(0.0, 0.9, 80.0, vec![1.0, 0.0]), face(90.0, 0.9, 80.0, vec![-1.0, 0.0])];
        let probe = vec![face(0.0, 0.9, 80.0, vec![0.5, 0.75f32.sqrt()])];
        let r = m.compare_multi(&stored, &probe);
        assert_eq!(r.matches.len(), 1);
        assert_eq!(r.matches[0].result, "Possible Match");
        assert_eq!(r.unmatched_stored, vec![1]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = FaceMatchConfig {
            high_confidence_threshold: 1.5,
            ..Default::default()
        };
        assert!(FaceMatcher::new(cfg).is_err());
    }

    #[test]
    fn detect_without_detectors_fails() {
        let m = FaceMatcher::default();
        let img = GrayImage::new(4, 4, vec![0; 16]).unwrap();
        assert!(matches!(m.detect(&img), Err(FaceMatchError::Detector(_))));
    }
}

use serde::{Deserialize, Serialize};

use crate::config::ModelTable;
use crate::error::EnsembleError;
use crate::normalize::ScoreNormalizer;
use crate::quality::QualityContext;

/// Output of one model for one sample pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub model: String,
    pub raw_score: f64,
    pub normalized_score: f64,
    pub adaptive_threshold: f64,
    /// True when the model predicts "same identity".
    pub prediction: bool,
    /// `|normalized - threshold| * reliability`.
    pub confidence: f64,
    pub reliability: f64,
    pub weight: f64,
}

impl ModelResult {
    /// Turns a raw similarity into a scored result.
    ///
    /// Normalizes the score, fetches the model's adaptive threshold for the
    /// context, predicts "same" when the normalized score reaches the
    /// threshold and weighs the margin by the model's reliability.
    pub fn evaluate(
        table: &ModelTable,
        model: &str,
        raw_score: f64,
        ctx: Option<&QualityContext>,
    ) -> Result<Self, EnsembleError> {
        let cfg = table.require(model)?;
        let normalized_score = ScoreNormalizer::new(table.normalization.clone()).normalize(raw_score);
        let adaptive_threshold = table.adaptive_threshold(model, ctx)?;
        let prediction = normalized_score >= adaptive_threshold;
        let confidence = (normalized_score - adaptive_threshold).abs() * cfg.reliability;
        Ok(Self {
            model: model.to_string(),
            raw_score,
            normalized_score,
            adaptive_threshold,
            prediction,
            confidence,
            reliability: cfg.reliability,
            weight: cfg.weight,
        })
    }

    /// Whether this result may take part in aggregation.
    pub fn is_usable(&self) -> bool {
        self.weight > 0.0
            && self.reliability > 0.0
            && self.normalized_score.is_finite()
            && self.confidence.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_perfect_match() {
        let t = ModelTable::default();
        let r = ModelResult::evaluate(&t, "mfcc_cosine", 1.0, None).unwrap();
        assert!(r.prediction);
        assert_eq!(r.adaptive_threshold, 0.97);
        assert_eq!(r.weight, 0.12);
        assert_eq!(r.reliability, 0.85);
        let expected = (r.normalized_score - 0.97).abs() * 0.85;
        assert!((r.confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn evaluate_negated_vectors_predict_different() {
        let t = ModelTable::default();
        for name in ["mfcc_cosine", "spectral_similarity", "pitch_analysis", "formant_analysis"] {
            let r = ModelResult::evaluate(&t, name, -1.0, None).unwrap();
            assert_eq!(r.normalized_score, 0.0);
            assert!(!r.prediction, "{name} should predict different");
        }
    }

    #[test]
    fn evaluate_uses_context() {
        let t = ModelTable::default();
        let ctx = QualityContext::new(0.9, 0.0);
        let r = ModelResult::evaluate(&t, "xvector", 0.87, Some(&ctx)).unwrap();
        assert!((r.adaptive_threshold - 0.86).abs() < 1e-12);
        assert!(r.prediction);
    }

    #[test]
    fn evaluate_unknown_model() {
        let t = ModelTable::default();
        assert!(ModelResult::evaluate(&t, "missing", 0.5, None).is_err());
    }

    #[test]
    fn serializes_snake_case_fields() {
        let t = ModelTable::default();
        let r = ModelResult::evaluate(&t, "pitch_analysis", 0.5, None).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["model"], "pitch_analysis");
        assert!(json.get("normalized_score").is_some());
        assert!(json.get("adaptive_threshold").is_some());
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EnsembleConfig;
use crate::quality::QualityContext;
use crate::result::ModelResult;

/// Final same/different call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchResult {
    Same,
    Different,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Same => write!(f, "SAME"),
            Self::Different => write!(f, "DIFFERENT"),
        }
    }
}

/// Confidence tier of a verdict, from a fixed rule ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceTier {
    #[serde(rename = "Very Low")]
    VeryLow,
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl ConfidenceTier {
    /// Evaluates the ladder top-down; the first matching rule wins.
    pub fn classify(score: f64, vote_ratio: f64, unanimous: bool, reliability: f64) -> Self {
        if score >= 0.98 && unanimous && reliability >= 0.95 {
            Self::VeryHigh
        } else if score >= 0.96 && vote_ratio >= 0.9 && reliability >= 0.9 {
            Self::High
        } else if score >= 0.93 && vote_ratio >= 0.85 && reliability >= 0.85 {
            Self::Moderate
        } else if score >= 0.90 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VeryHigh => write!(f, "Very High"),
            Self::High => write!(f, "High"),
            Self::Moderate => write!(f, "Moderate"),
            Self::Low => write!(f, "Low"),
            Self::VeryLow => write!(f, "Very Low"),
        }
    }
}

/// Pass/fail of the four decision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerResults {
    pub score_check: bool,
    pub consensus_check: bool,
    pub reliability_check: bool,
    pub model_count_check: bool,
}

impl LayerResults {
    pub fn all_passed(&self) -> bool {
        self.score_check && self.consensus_check && self.reliability_check && self.model_count_check
    }
}

/// The ensemble's decision for one sample pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleVerdict {
    pub verified: bool,
    pub result: MatchResult,
    /// Weighted mean of normalized scores, in `[0, 1]`.
    pub ensemble_score: f64,
    /// `ensemble_score` rounded to 4 decimals.
    pub score: f64,
    pub effective_threshold: f64,
    /// Fraction of models predicting "same".
    pub vote_ratio: f64,
    pub average_reliability: f64,
    pub layer_results: LayerResults,
    /// Enhanced consensus outcome; only set for borderline scores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_consensus: Option<bool>,
    pub confidence: ConfidenceTier,
    /// Heuristic false-accept estimate, not a measured rate.
    #[serde(rename = "estimatedFAR")]
    pub estimated_far: f64,
    /// Heuristic false-reject estimate, not a measured rate.
    #[serde(rename = "estimatedFRR")]
    pub estimated_frr: f64,
    pub high_confidence_exception: bool,
    /// One-line summary, e.g. `"Ensemble: 0.9731, Models: 6"`.
    pub details: String,
    pub model_results: Vec<ModelResult>,
}

/// Terminal state of one verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Enough models contributed; the verdict says SAME or DIFFERENT.
    Verdict(EnsembleVerdict),
    /// Too few models produced a result to support any decision.
    InsufficientModels { valid: usize, required: usize },
}

impl Outcome {
    pub fn verdict(&self) -> Option<&EnsembleVerdict> {
        match self {
            Self::Verdict(v) => Some(v),
            Self::InsufficientModels { .. } => None,
        }
    }

    pub fn into_verdict(self) -> Option<EnsembleVerdict> {
        match self {
            Self::Verdict(v) => Some(v),
            Self::InsufficientModels { .. } => None,
        }
    }

    /// True only for an accepted verdict.
    pub fn is_verified(&self) -> bool {
        self.verdict().is_some_and(|v| v.verified)
    }
}

/// Combines per-model results into one decision.
///
/// # Algorithm
///
/// 1. Results with non-positive weight or reliability are dropped; fewer
///    than `minimum_models` left -> [`Outcome::InsufficientModels`].
/// 2. Each model's weight is adjusted to
///    `weight * (1 + min(0.2, confidence)) * reliability` and the ensemble
///    score is the adjusted-weight mean of normalized scores.
/// 3. The effective threshold is the strict threshold, raised for low
///    quality pairs and by a positive duration penalty.
/// 4. Four layers (score, consensus, reliability, model count) must pass.
///    The high-confidence exception forces the reliability layer to pass.
/// 5. Borderline scores additionally need enhanced consensus.
///
/// The engine holds only immutable configuration and can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct EnsembleEngine {
    cfg: EnsembleConfig,
}

impl EnsembleEngine {
    pub fn new(cfg: EnsembleConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.cfg
    }

    /// Effective L1 threshold for the given context.
    pub fn effective_threshold(&self, ctx: Option<&QualityContext>) -> f64 {
        let mut threshold = self.cfg.strict_threshold;
        if let Some(ctx) = ctx {
            if ctx.quality < self.cfg.low_quality_cutoff {
                threshold += self.cfg.low_quality_increase;
            }
            if ctx.duration_penalty > 0.0 {
                threshold += ctx.duration_penalty;
            }
        }
        threshold
    }

    /// Renders a decision from the valid results of one verification.
    pub fn decide(&self, results: Vec<ModelResult>, ctx: Option<&QualityContext>) -> Outcome {
        let cfg = &self.cfg;
        let offered = results.len();
        let valid: Vec<ModelResult> = results.into_iter().filter(ModelResult::is_usable).collect();
        if valid.len() < offered {
            debug!(dropped = offered - valid.len(), "ensemble: dropped unusable results");
        }

        let count = valid.len();
        if count < cfg.minimum_models {
            warn!(valid = count, required = cfg.minimum_models, "ensemble: insufficient models");
            return Outcome::InsufficientModels {
                valid: count,
                required: cfg.minimum_models,
            };
        }

        let mut weighted_sum = 0.0f64;
        let mut total_weight = 0.0f64;
        let mut votes = 0usize;
        let mut reliability_sum = 0.0f64;

        for r in &valid {
            let adjusted = r.weight * (1.0 + r.confidence.min(0.2)) * r.reliability;
            weighted_sum += r.normalized_score * adjusted;
            total_weight += adjusted;
            reliability_sum += r.reliability;
            if r.prediction {
                votes += 1;
            }
            debug!(
                model = %r.model,
                normalized = r.normalized_score,
                threshold = r.adaptive_threshold,
                same = r.prediction,
                weight = r.weight,
                adjusted_weight = adjusted,
                reliability = r.reliability,
                "ensemble: model result"
            );
        }

        let ensemble_score = if total_weight > 0.0 {
            (weighted_sum / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let vote_ratio = votes as f64 / count as f64;
        let unanimous = votes == count;
        let average_reliability = reliability_sum / count as f64;
        let effective_threshold = self.effective_threshold(ctx);

        let ex = &cfg.exception;
        let high_confidence_exception = ensemble_score >= ex.min_score
            && unanimous
            && average_reliability >= ex.min_reliability
            && count >= ex.min_models;

        let layer_results = LayerResults {
            score_check: ensemble_score >= effective_threshold,
            consensus_check: vote_ratio >= cfg.consensus_requirement,
            reliability_check: high_confidence_exception
                || average_reliability >= cfg.reliability_requirement,
            model_count_check: count >= cfg.minimum_models,
        };

        let bl = &cfg.borderline;
        let enhanced_consensus = (ensemble_score >= bl.low && ensemble_score < bl.high)
            .then_some(vote_ratio >= bl.consensus);

        let verified = layer_results.all_passed() && enhanced_consensus != Some(false);
        let result = if verified {
            MatchResult::Same
        } else {
            MatchResult::Different
        };

        let confidence =
            ConfidenceTier::classify(ensemble_score, vote_ratio, unanimous, average_reliability);

        let er = &cfg.error_rates;
        let estimated_far = er.far_floor.max((1.0 - ensemble_score) * er.far_scale);
        let estimated_frr = if verified {
            er.accepted_frr
        } else {
            er.frr_floor
                .max((effective_threshold - ensemble_score) * er.frr_scale)
        };

        debug!(
            effective_threshold,
            vote_ratio,
            average_reliability,
            l1 = layer_results.score_check,
            l2 = layer_results.consensus_check,
            l3 = layer_results.reliability_check,
            l4 = layer_results.model_count_check,
            exception = high_confidence_exception,
            enhanced = ?enhanced_consensus,
            "ensemble: layer analysis"
        );
        info!(
            score = ensemble_score,
            models = count,
            %result,
            %confidence,
            far = estimated_far,
            frr = estimated_frr,
            "ensemble: decision"
        );

        let score = (ensemble_score * 10_000.0).round() / 10_000.0;
        let details = format!("Ensemble: {score:.4}, Models: {count}");
        Outcome::Verdict(EnsembleVerdict {
            verified,
            result,
            ensemble_score,
            score,
            effective_threshold,
            vote_ratio,
            average_reliability,
            layer_results,
            enhanced_consensus,
            confidence,
            estimated_far,
            estimated_frr,
            high_confidence_exception,
            details,
            model_results: valid,
        })
    }
}

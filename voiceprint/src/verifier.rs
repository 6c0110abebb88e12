use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vouch_ensemble::similarity::cosine_similarity;
use vouch_ensemble::{EnsembleEngine, MatchResult, ModelResult, ModelTable, Outcome, QualityContext};

use crate::features::{Extraction, FeatureKind};
use crate::model::ModelRegistry;
use crate::quality::{DurationPolicy, QualityAssessor};
use crate::scorer::{score_embedding, score_features};
use crate::{AudioSample, VoiceprintError};

/// Duration requirements presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// 5 s minimum.
    Strict,
    /// 3 s minimum.
    #[default]
    Standard,
    /// 1 s minimum.
    Lightweight,
}

impl VerificationMode {
    pub fn min_duration_secs(self) -> f64 {
        match self {
            Self::Strict => 5.0,
            Self::Standard => 3.0,
            Self::Lightweight => 1.0,
        }
    }
}

impl std::str::FromStr for VerificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "standard" => Ok(Self::Standard),
            "lightweight" => Ok(Self::Lightweight),
            other => Err(format!("unknown verification mode: {other}")),
        }
    }
}

/// Options for [`Verifier`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierOptions {
    pub mode: VerificationMode,
    /// Overrides the mode's minimum duration.
    pub min_duration_secs: Option<f64>,
    /// When set, both samples must have exactly this rate.
    pub expected_sample_rate: Option<u32>,
}

impl VerifierOptions {
    fn duration_policy(&self) -> DurationPolicy {
        DurationPolicy {
            min_secs: self
                .min_duration_secs
                .unwrap_or_else(|| self.mode.min_duration_secs()),
            ..Default::default()
        }
    }
}

/// How a configured model gets its raw score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scorer {
    Features(FeatureKind),
    Embedding,
}

impl Scorer {
    fn for_model(name: &str) -> Self {
        FeatureKind::from_model_name(name).map_or(Self::Embedding, Self::Features)
    }
}

/// Multi-model voice verifier.
///
/// Holds only immutable state: the model table, the embedding model
/// registry and the options. Every call recomputes all features, so
/// identical inputs give identical verdicts.
#[derive(Debug, Clone)]
pub struct Verifier {
    table: ModelTable,
    registry: ModelRegistry,
    options: VerifierOptions,
    engine: EnsembleEngine,
    assessor: QualityAssessor,
}

impl Verifier {
    /// Validates the table and builds a verifier.
    pub fn new(
        table: ModelTable,
        registry: ModelRegistry,
        options: VerifierOptions,
    ) -> Result<Self, VoiceprintError> {
        table.validate()?;
        if options.min_duration_secs.is_some_and(|d| !(d > 0.0 && d.is_finite())) {
            return Err(VoiceprintError::InvalidSample(
                "minimum duration must be positive".into(),
            ));
        }
        let engine = EnsembleEngine::new(table.ensemble.clone());
        let assessor = QualityAssessor::new(options.duration_policy());
        Ok(Self {
            table,
            registry,
            options,
            engine,
            assessor,
        })
    }

    pub fn table(&self) -> &ModelTable {
        &self.table
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    /// Configured models that can currently produce scores, in table order.
    pub fn available_models(&self) -> Vec<&str> {
        self.table
            .names()
            .filter(|name| match Scorer::for_model(name) {
                Scorer::Features(_) => true,
                Scorer::Embedding => self.registry.is_loaded(name),
            })
            .collect()
    }

    fn validate_pair(&self, a: &AudioSample, b: &AudioSample) -> Result<(), VoiceprintError> {
        a.validate()?;
        b.validate()?;
        if a.sample_rate() != b.sample_rate() {
            return Err(VoiceprintError::InvalidSample(format!(
                "sample rates differ: {} vs {}",
                a.sample_rate(),
                b.sample_rate()
            )));
        }
        match self.options.expected_sample_rate {
            Some(expected) if a.sample_rate() != expected => {
                return Err(VoiceprintError::InvalidSample(format!(
                    "expected {expected} Hz, got {} Hz",
                    a.sample_rate()
                )));
            }
            _ => {}
        }
        Ok(())
    }

    /// Runs the full ensemble on a stored and a probe sample.
    pub fn verify(&self, stored: &AudioSample, probe: &AudioSample) -> Result<Outcome, VoiceprintError> {
        self.validate_pair(stored, probe)?;

        let (ctx, reports) = self.assessor.assess_pair(stored, probe);
        for (label, r) in ["stored", "probe"].iter().zip(&reports) {
            debug!(
                sample = *label,
                quality = r.quality,
                snr_db = r.snr_db,
                duration_secs = r.duration.duration_secs,
                duration_ok = r.duration.passed,
                "verifier: sample quality"
            );
        }

        let names: Vec<&str> = self.table.names().collect();
        let kinds: Vec<FeatureKind> = FeatureKind::ALL
            .into_iter()
            .filter(|k| names.contains(&k.model_name()))
            .collect();
        let extractions = extract_pairs(&kinds, stored, probe);

        let results = score_models(&names, |name| self.score_model(name, &extractions, stored, probe, &ctx));
        debug!(
            configured = names.len(),
            scored = results.len(),
            "verifier: model scoring complete"
        );

        let outcome = self.engine.decide(results, Some(&ctx));
        if let Some(v) = outcome.verdict() {
            info!(
                verified = v.verified,
                score = v.score,
                confidence = %v.confidence,
                "verifier: {}",
                v.details
            );
        }
        Ok(outcome)
    }

    fn score_model(
        &self,
        name: &str,
        extractions: &HashMap<FeatureKind, (Extraction, Extraction)>,
        stored: &AudioSample,
        probe: &AudioSample,
        ctx: &QualityContext,
    ) -> Option<ModelResult> {
        match Scorer::for_model(name) {
            Scorer::Features(kind) => {
                let (a, b) = extractions.get(&kind)?;
                score_features(&self.table, name, a, b, Some(ctx))
            }
            Scorer::Embedding => {
                let handle = self.registry.handle(name);
                score_embedding(&self.table, name, &handle, stored, probe, Some(ctx))
            }
        }
    }

    /// Two-feature fast path: MFCC and spectral cosine only.
    pub fn verify_simplified(
        &self,
        stored: &AudioSample,
        probe: &AudioSample,
    ) -> Result<SimplifiedVerdict, VoiceprintError> {
        self.validate_pair(stored, probe)?;

        let similarity = |kind: FeatureKind| -> f64 {
            let (a, b) = (kind.extract(stored), kind.extract(probe));
            match (a.vector(), b.vector()) {
                (Some(a), Some(b)) => {
                    cosine_similarity(a.values(), b.values()).map_or(0.0, |s| s.clamp(0.0, 1.0))
                }
                _ => 0.0,
            }
        };
        let mfcc_similarity = similarity(FeatureKind::Cepstral);
        let spectral_similarity = similarity(FeatureKind::Spectral);
        let score = SIMPLIFIED_MFCC_WEIGHT * mfcc_similarity + SIMPLIFIED_SPECTRAL_WEIGHT * spectral_similarity;
        let verified = score >= SIMPLIFIED_THRESHOLD;
        let confidence = SimplifiedConfidence::from_score(score);
        let result = if verified {
            MatchResult::Same
        } else {
            MatchResult::Different
        };
        let details = format!(
            "MFCC: {mfcc_similarity:.3}, Spectral: {spectral_similarity:.3}, Ensemble: {score:.3}"
        );
        let model_results = [
            (FeatureKind::Cepstral, mfcc_similarity),
            (FeatureKind::Spectral, spectral_similarity),
        ]
        .into_iter()
        .map(|(kind, similarity)| SimplifiedModelResult {
            model: kind.model_name().to_string(),
            similarity,
            prediction: similarity >= SIMPLIFIED_MODEL_THRESHOLD,
        })
        .collect();

        info!(score, verified, %confidence, "verifier: simplified decision");
        Ok(SimplifiedVerdict {
            verified,
            result,
            score,
            threshold: SIMPLIFIED_THRESHOLD,
            confidence,
            details,
            mfcc_similarity,
            spectral_similarity,
            model_results,
        })
    }
}

const SIMPLIFIED_MFCC_WEIGHT: f64 = 0.6;
const SIMPLIFIED_SPECTRAL_WEIGHT: f64 = 0.4;
const SIMPLIFIED_THRESHOLD: f64 = 0.85;
/// Per-feature vote in a simplified verdict.
const SIMPLIFIED_MODEL_THRESHOLD: f64 = 0.8;

/// Confidence of a simplified verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimplifiedConfidence {
    High,
    Medium,
    Low,
}

impl SimplifiedConfidence {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Self::High
        } else if score >= 0.8 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for SimplifiedConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// Result of [`Verifier::verify_simplified`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedVerdict {
    pub verified: bool,
    pub result: MatchResult,
    pub score: f64,
    pub threshold: f64,
    pub confidence: SimplifiedConfidence,
    /// e.g. `"MFCC: 0.912, Spectral: 0.874, Ensemble: 0.897"`.
    pub details: String,
    pub mfcc_similarity: f64,
    pub spectral_similarity: f64,
    pub model_results: Vec<SimplifiedModelResult>,
}

/// One feature's share of a simplified verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedModelResult {
    pub model: String,
    pub similarity: f64,
    /// `similarity >= 0.8`.
    pub prediction: bool,
}

#[cfg(feature = "parallel")]
fn extract_pairs(
    kinds: &[FeatureKind],
    a: &AudioSample,
    b: &AudioSample,
) -> HashMap<FeatureKind, (Extraction, Extraction)> {
    use rayon::prelude::*;

    kinds
        .par_iter()
        .map(|&k| {
            let (ea, eb) = rayon::join(|| k.extract(a), || k.extract(b));
            (k, (ea, eb))
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn extract_pairs(
    kinds: &[FeatureKind],
    a: &AudioSample,
    b: &AudioSample,
) -> HashMap<FeatureKind, (Extraction, Extraction)> {
    kinds
        .iter()
        .map(|&k| (k, (k.extract(a), k.extract(b))))
        .collect()
}

/// Scores every model, keeping table order and dropping models without a
/// result.
#[cfg(feature = "parallel")]
fn score_models<F>(names: &[&str], score: F) -> Vec<ModelResult>
where
    F: Fn(&str) -> Option<ModelResult> + Sync,
{
    use rayon::prelude::*;

    let scored: Vec<Option<ModelResult>> = names.par_iter().map(|n| score(*n)).collect();
    scored.into_iter().flatten().collect()
}

#[cfg(not(feature = "parallel"))]
fn score_models<F>(names: &[&str], score: F) -> Vec<ModelResult>
where
    F: Fn(&str) -> Option<ModelResult>,
{
    names.iter().filter_map(|n| score(*n)).collect()
}

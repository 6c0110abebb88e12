//! Per-model scoring: raw similarity -> [`ModelResult`].
//!
//! Scorers never fail loudly. Anything that prevents a trustworthy score
//! (failed extraction, degenerate vectors, model errors) yields `None` and
//! the model simply sits out the ensemble.

use tracing::{debug, warn};
use vouch_ensemble::similarity::{cosine_similarity, euclidean_distance, widen};
use vouch_ensemble::{ModelResult, ModelTable, QualityContext};

use crate::features::Extraction;
use crate::model::{ModelHandle, SimilarityMetric};
use crate::AudioSample;

/// Raw similarity of two embeddings under `metric`.
pub fn embedding_similarity(a: &[f32], b: &[f32], metric: SimilarityMetric) -> Option<f64> {
    let (a, b) = (widen(a), widen(b));
    match metric {
        SimilarityMetric::Cosine => cosine_similarity(&a, &b),
        SimilarityMetric::Euclidean => euclidean_distance(&a, &b).map(|d| 1.0 / (1.0 + d)),
    }
}

/// Evaluates a raw score against the model's configuration.
fn evaluate(
    table: &ModelTable,
    model: &str,
    raw: f64,
    ctx: Option<&QualityContext>,
) -> Option<ModelResult> {
    match ModelResult::evaluate(table, model, raw, ctx) {
        Ok(r) => {
            debug!(
                model,
                raw = r.raw_score,
                normalized = r.normalized_score,
                threshold = r.adaptive_threshold,
                same = r.prediction,
                "scorer: model scored"
            );
            Some(r)
        }
        Err(e) => {
            warn!(model, error = %e, "scorer: no configuration");
            None
        }
    }
}

/// Scores a feature model from the two samples' extractions.
pub fn score_features(
    table: &ModelTable,
    model: &str,
    a: &Extraction,
    b: &Extraction,
    ctx: Option<&QualityContext>,
) -> Option<ModelResult> {
    let (va, vb) = match (a, b) {
        (Extraction::Extracted(va), Extraction::Extracted(vb)) => (va, vb),
        (Extraction::Failed { reason, .. }, _) | (_, Extraction::Failed { reason, .. }) => {
            warn!(model, reason = %reason, "scorer: feature extraction failed");
            return None;
        }
    };
    if va.kind() != vb.kind() {
        warn!(model, a = %va.kind(), b = %vb.kind(), "scorer: mismatched feature kinds");
        return None;
    }
    let Some(raw) = cosine_similarity(va.values(), vb.values()) else {
        debug!(model, "scorer: degenerate feature vectors");
        return None;
    };
    evaluate(table, model, raw, ctx)
}

/// Scores an embedding model by embedding both samples.
pub fn score_embedding(
    table: &ModelTable,
    model: &str,
    handle: &ModelHandle,
    a: &AudioSample,
    b: &AudioSample,
    ctx: Option<&QualityContext>,
) -> Option<ModelResult> {
    let ModelHandle::Loaded(embedder, metric) = handle else {
        debug!(model, "scorer: model unavailable");
        return None;
    };
    let embed = |s: &AudioSample| match embedder.embed(s) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(model, error = %e, "scorer: embedding failed");
            None
        }
    };
    let ea = embed(a)?;
    let eb = embed(b)?;
    if ea.len() != eb.len() {
        warn!(model, a = ea.len(), b = eb.len(), "scorer: embedding dimension mismatch");
        return None;
    }
    let Some(raw) = embedding_similarity(&ea, &eb, *metric) else {
        debug!(model, "scorer: degenerate embeddings");
        return None;
    };
    evaluate(table, model, raw, ctx)
}

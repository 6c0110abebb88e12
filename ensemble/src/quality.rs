use serde::{Deserialize, Serialize};

/// Per-call quality assessment of a sample pair.
///
/// Consumed by the adaptive threshold engine and by the ensemble's effective
/// threshold. Never shared across calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityContext {
    /// Combined quality in `[0, 1]`: the worse of the two samples.
    pub quality: f64,
    /// Duration penalty: the larger of the two samples' penalties.
    /// Negative values are bonuses for long recordings.
    pub duration_penalty: f64,
    /// Individual qualities of the first and second sample.
    pub sample_qualities: [f64; 2],
}

impl QualityContext {
    /// Creates a context from an already-combined quality and penalty.
    pub fn new(quality: f64, duration_penalty: f64) -> Self {
        Self {
            quality,
            duration_penalty,
            sample_qualities: [quality, quality],
        }
    }

    /// Combines two per-sample assessments: min quality, max penalty.
    pub fn from_pair(quality_a: f64, penalty_a: f64, quality_b: f64, penalty_b: f64) -> Self {
        Self {
            quality: quality_a.min(quality_b),
            duration_penalty: penalty_a.max(penalty_b),
            sample_qualities: [quality_a, quality_b],
        }
    }
}

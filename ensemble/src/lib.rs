//! Modality-agnostic core of a multi-model biometric verifier.
//!
//! # Architecture
//!
//! Each model in the ensemble contributes one raw similarity score for a
//! sample pair. The crate turns those scores into a single decision:
//!
//! 1. [`ScoreNormalizer`]: raw similarity -> calibrated `[0, 1]` score
//! 2. [`ModelTable::adaptive_threshold`]: strict threshold adjusted by the
//!    pair's [`QualityContext`]
//! 3. [`ModelResult::evaluate`]: prediction and reliability-weighted confidence
//! 4. [`EnsembleEngine::decide`]: weighted aggregation and four layer checks
//!    -> [`Outcome`]
//!
//! # Decision Layers
//!
//! ```text
//! L1 score:       ensemble score >= effective threshold
//! L2 consensus:   vote ratio     >= consensus requirement
//! L3 reliability: avg reliability >= 0.84 (or high-confidence exception)
//! L4 model count: valid models   >= minimum
//! ```
//!
//! Scores in the borderline band `[0.90, 0.96)` additionally need an
//! enhanced consensus of 0.95.
//!
//! Feature extraction and sample acquisition live in the modality crates;
//! this crate never touches raw samples.

mod config;
mod decision;
mod error;
mod normalize;
mod quality;
mod result;
pub mod similarity;
mod threshold;

pub use config::{
    BorderlineConfig, ContextAdjustments, EnsembleConfig, ErrorRateConfig, ExceptionConfig,
    ModelConfig, ModelEntry, ModelTable, NormalizationConfig,
};
pub use decision::{
    ConfidenceTier, EnsembleEngine, EnsembleVerdict, LayerResults, MatchResult, Outcome,
};
pub use error::EnsembleError;
pub use normalize::ScoreNormalizer;
pub use quality::QualityContext;
pub use result::ModelResult;
pub use similarity::{cosine_similarity, euclidean_distance};
pub use threshold::adaptive_threshold;

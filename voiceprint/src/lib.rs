//! Voice verification over a multi-model ensemble.
//!
//! # Architecture
//!
//! [`Verifier::verify`] processes a stored and a probe sample in four stages:
//!
//! 1. [`QualityAssessor`]: SNR, dynamic range, spectral content and
//!    duration -> [`QualityContext`](vouch_ensemble::QualityContext)
//! 2. [`FeatureKind::extract`]: cepstral, spectral, pitch and formant
//!    statistics for both samples
//! 3. [`scorer`]: cosine similarity per feature model, embedding similarity
//!    per [`EmbeddingModel`] in the [`ModelRegistry`]
//! 4. [`EnsembleEngine::decide`](vouch_ensemble::EnsembleEngine::decide):
//!    weighted, layered decision -> [`Outcome`](vouch_ensemble::Outcome)
//!
//! # Models
//!
//! ```text
//! mfcc_cosine          13 MFCC + deltas, mean/std/median   117 dims
//! spectral_similarity  shape, contrast, chroma, tonnetz     58 dims
//! pitch_analysis       YIN + autocorrelation F0 stats       12 dims
//! formant_analysis     autocorrelation resonances            8 dims
//! fbank_embedding      pooled log mel filterbank           160 dims
//! ecapa_*, xvector     injected through ModelRegistry
//! ```
//!
//! # Filterbank Baseline
//!
//! [`FbankEmbeddingModel`] needs no weights: it pools [`compute_fbank`]
//! log mel energies (Kaldi framing, 80 bands) over 3 s segments and keeps
//! the per-band mean and spread.
//!
//! All FFTs use `rustfft`. With the `parallel` feature (default) feature
//! extraction and model scoring run on the rayon pool.

mod dsp;
mod error;
pub mod fbank;
pub mod features;
mod model;
mod model_fbank;
mod quality;
mod sample;
pub mod scorer;
mod verifier;

pub use error::VoiceprintError;
pub use fbank::{compute_fbank, l2_normalize, FbankConfig, FbankWindow};
pub use features::{Extraction, FeatureKind, FeatureVector};
pub use model::{EmbeddingModel, ModelHandle, ModelRegistry, SimilarityMetric};
pub use model_fbank::{FbankEmbeddingModel, FBANK_EMBEDDING_MODEL};
pub use quality::{snr_db, DurationCheck, DurationPolicy, QualityAssessor, QualityReport};
pub use sample::AudioSample;
pub use verifier::{
    SimplifiedConfidence, SimplifiedModelResult, SimplifiedVerdict, VerificationMode, Verifier,
    VerifierOptions,
};

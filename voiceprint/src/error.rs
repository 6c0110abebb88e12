use thiserror::Error;
use vouch_ensemble::EnsembleError;

/// Errors returned by voiceprint operations.
#[derive(Debug, Error)]
pub enum VoiceprintError {
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    #[error("audio too short: need at least {min_samples} samples, got {got_samples}")]
    AudioTooShort { min_samples: usize, got_samples: usize },

    #[error("model error: {0}")]
    Model(String),

    #[error(transparent)]
    Config(#[from] EnsembleError),
}

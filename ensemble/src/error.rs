use thiserror::Error;

/// Errors returned by ensemble configuration and scoring.
#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

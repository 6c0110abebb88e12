//! Hand-crafted voice feature extractors.
//!
//! Every extractor is a pure function of one [`AudioSample`] and yields an
//! [`Extraction`]. A failed extraction never aborts verification; the
//! corresponding model simply contributes no score.

mod cepstral;
mod formant;
mod pitch;
mod spectral;
pub(crate) mod stats;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AudioSample;

pub use cepstral::{extract_cepstral, CEPSTRAL_DIM};
pub use formant::{extract_formant, FORMANT_DIM};
pub use pitch::{extract_pitch, PITCH_DIM};
pub use spectral::{extract_spectral, SPECTRAL_DIM};

/// Identity of a feature extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Cepstral,
    Spectral,
    Pitch,
    Formant,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [Self::Cepstral, Self::Spectral, Self::Pitch, Self::Formant];

    /// The ensemble model scored from this feature.
    pub fn model_name(self) -> &'static str {
        match self {
            Self::Cepstral => "mfcc_cosine",
            Self::Spectral => "spectral_similarity",
            Self::Pitch => "pitch_analysis",
            Self::Formant => "formant_analysis",
        }
    }

    pub fn from_model_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.model_name() == name)
    }

    pub fn extract(self, sample: &AudioSample) -> Extraction {
        let values = match self {
            Self::Cepstral => extract_cepstral(sample),
            Self::Spectral => Ok(extract_spectral(sample)),
            Self::Pitch => Ok(extract_pitch(sample)),
            Self::Formant => Ok(extract_formant(sample)),
        };
        match values {
            Ok(values) => Extraction::from_values(self, values),
            Err(reason) => Extraction::Failed { kind: self, reason },
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cepstral => "cepstral",
            Self::Spectral => "spectral",
            Self::Pitch => "pitch",
            Self::Formant => "formant",
        };
        f.write_str(name)
    }
}

/// An extracted feature vector tagged with its extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    kind: FeatureKind,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Result of running one extractor on one sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Extracted(FeatureVector),
    Failed { kind: FeatureKind, reason: String },
}

impl Extraction {
    /// Wraps raw values, failing on any non-finite entry.
    pub fn from_values(kind: FeatureKind, values: Vec<f64>) -> Self {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Self::Failed {
                kind,
                reason: format!("non-finite value at index {i}"),
            };
        }
        Self::Extracted(FeatureVector { kind, values })
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::Extracted(v) => v.kind,
            Self::Failed { kind, .. } => *kind,
        }
    }

    pub fn vector(&self) -> Option<&FeatureVector> {
        match self {
            Self::Extracted(v) => Some(v),
            Self::Failed { .. } => None,
        }
    }
}

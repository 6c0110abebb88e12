use serde::{Deserialize, Serialize};

use crate::error::EnsembleError;

/// Static per-model configuration.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Equal-error-rate operating point (informational).
    pub base_threshold: f64,
    /// Threshold actually used for decisions before context adjustment.
    pub strict_threshold: f64,
    /// Nominal ensemble weight in (0, 1].
    pub weight: f64,
    /// Static confidence in the model itself, in (0, 1].
    #[serde(alias = "reliability_score")]
    pub reliability: f64,
}

impl ModelConfig {
    pub const fn new(base_threshold: f64, strict_threshold: f64, weight: f64, reliability: f64) -> Self {
        Self {
            base_threshold,
            strict_threshold,
            weight,
            reliability,
        }
    }
}

/// A named row of the model table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(flatten)]
    pub config: ModelConfig,
}

/// Ensemble-level decision parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Lenient ensemble threshold (informational, default: 0.92).
    pub base_threshold: f64,
    /// Threshold for the L1 score check (default: 0.96).
    pub strict_threshold: f64,
    /// Minimum vote ratio for the L2 consensus check (default: 0.90).
    pub consensus_requirement: f64,
    /// Minimum number of valid model results (default: 4).
    pub minimum_models: usize,
    /// Minimum average reliability for the L3 check (default: 0.84).
    pub reliability_requirement: f64,
    /// Combined quality under which the threshold is raised (default: 0.4).
    pub low_quality_cutoff: f64,
    /// Threshold increase for low-quality pairs (default: 0.03).
    pub low_quality_increase: f64,
    /// Target false-accept rate (informational, default: 0.01).
    pub far_target: f64,
    /// Target false-reject rate (informational, default: 0.05).
    pub frr_target: f64,
    pub exception: ExceptionConfig,
    pub borderline: BorderlineConfig,
    pub error_rates: ErrorRateConfig,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            base_threshold: 0.92,
            strict_threshold: 0.96,
            consensus_requirement: 0.90,
            minimum_models: 4,
            reliability_requirement: 0.84,
            low_quality_cutoff: 0.4,
            low_quality_increase: 0.03,
            far_target: 0.01,
            frr_target: 0.05,
            exception: ExceptionConfig::default(),
            borderline: BorderlineConfig::default(),
            error_rates: ErrorRateConfig::default(),
        }
    }
}

/// High-confidence exception: overrides the L3 reliability check when the
/// ensemble is unanimous and the score is very high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExceptionConfig {
    pub min_score: f64,
    pub min_reliability: f64,
    pub min_models: usize,
}

impl Default for ExceptionConfig {
    fn default() -> Self {
        Self {
            min_score: 0.97,
            min_reliability: 0.82,
            min_models: 5,
        }
    }
}

/// Borderline dampener: scores in `[low, high)` need `consensus` votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderlineConfig {
    pub low: f64,
    pub high: f64,
    pub consensus: f64,
}

impl Default for BorderlineConfig {
    fn default() -> Self {
        Self {
            low: 0.90,
            high: 0.96,
            consensus: 0.95,
        }
    }
}

/// Coefficients of the heuristic FAR/FRR estimates.
///
/// These are not measured error rates. They stay configurable until real
/// genuine/impostor score distributions are available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorRateConfig {
    pub far_floor: f64,
    pub far_scale: f64,
    pub frr_floor: f64,
    pub frr_scale: f64,
    pub accepted_frr: f64,
}

impl Default for ErrorRateConfig {
    fn default() -> Self {
        Self {
            far_floor: 0.001,
            far_scale: 0.1,
            frr_floor: 0.01,
            frr_scale: 0.2,
            accepted_frr: 0.01,
        }
    }
}

/// Quality-driven threshold adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextAdjustments {
    /// Quality at or above which the bonus applies (default: 0.8).
    pub high_quality_cutoff: f64,
    /// Added to the threshold for clean input (default: -0.02).
    pub high_quality_bonus: f64,
    /// Quality at or below which the penalty applies (default: 0.3).
    pub low_quality_cutoff: f64,
    /// Added to the threshold for noisy input (default: 0.05).
    pub low_quality_penalty: f64,
    /// Lower clamp of adjusted thresholds (default: 0.1).
    pub min_threshold: f64,
    /// Upper clamp of adjusted thresholds (default: 0.99).
    pub max_threshold: f64,
}

impl Default for ContextAdjustments {
    fn default() -> Self {
        Self {
            high_quality_cutoff: 0.8,
            high_quality_bonus: -0.02,
            low_quality_cutoff: 0.3,
            low_quality_penalty: 0.05,
            min_threshold: 0.1,
            max_threshold: 0.99,
        }
    }
}

/// Static z-score normalization against a reference population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub z_norm_enabled: bool,
    /// Reference population mean (default: 0.5).
    pub cohort_mean: f64,
    /// Reference population standard deviation (default: 0.2).
    pub cohort_std: f64,
    /// Spread of the output band around 0.5 (default: 0.2).
    pub spread: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            z_norm_enabled: true,
            cohort_mean: 0.5,
            cohort_std: 0.2,
            spread: 0.2,
        }
    }
}

/// Process-wide model configuration table.
///
/// Row order is significant: per-model results are reported in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelTable {
    pub models: Vec<ModelEntry>,
    pub ensemble: EnsembleConfig,
    pub context: ContextAdjustments,
    pub normalization: NormalizationConfig,
}

impl Default for ModelTable {
    fn default() -> Self {
        let rows: [(&str, ModelConfig); 8] = [
            ("ecapa_voxceleb", ModelConfig::new(0.88, 0.92, 0.25, 0.95)),
            ("ecapa_voxceleb2", ModelConfig::new(0.90, 0.94, 0.22, 0.92)),
            ("xvector", ModelConfig::new(0.82, 0.88, 0.18, 0.88)),
            ("fbank_embedding", ModelConfig::new(0.86, 0.90, 0.15, 0.90)),
            ("mfcc_cosine", ModelConfig::new(0.94, 0.97, 0.12, 0.85)),
            ("spectral_similarity", ModelConfig::new(0.90, 0.95, 0.10, 0.82)),
            ("pitch_analysis", ModelConfig::new(0.85, 0.90, 0.08, 0.80)),
            ("formant_analysis", ModelConfig::new(0.78, 0.85, 0.05, 0.78)),
        ];
        Self {
            models: rows
                .into_iter()
                .map(|(name, config)| ModelEntry {
                    name: name.to_string(),
                    config,
                })
                .collect(),
            ensemble: EnsembleConfig::default(),
            context: ContextAdjustments::default(),
            normalization: NormalizationConfig::default(),
        }
    }
}

impl ModelTable {
    /// Parses a YAML table and validates it.
    ///
    /// Omitted sections keep their defaults; a `models` list replaces the
    /// default rows entirely.
    pub fn from_yaml(data: &str) -> Result<Self, EnsembleError> {
        let table: ModelTable = serde_yaml::from_str(data)?;
        table.validate()?;
        Ok(table)
    }

    /// Serializes the table to YAML.
    pub fn to_yaml(&self) -> Result<String, EnsembleError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Returns the configuration of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|e| e.name == name).map(|e| &e.config)
    }

    /// Returns the configuration of `name` or [`EnsembleError::UnknownModel`].
    pub fn require(&self, name: &str) -> Result<&ModelConfig, EnsembleError> {
        self.get(name)
            .ok_or_else(|| EnsembleError::UnknownModel(name.to_string()))
    }

    /// Iterates model names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|e| e.name.as_str())
    }

    /// Checks value ranges and duplicate names.
    pub fn validate(&self) -> Result<(), EnsembleError> {
        if self.models.is_empty() {
            return Err(EnsembleError::InvalidConfig("model table is empty".into()));
        }
        for (i, entry) in self.models.iter().enumerate() {
            let c = &entry.config;
            if entry.name.is_empty() {
                return Err(EnsembleError::InvalidConfig(format!("model {i} has no name")));
            }
            if self.models[..i].iter().any(|e| e.name == entry.name) {
                return Err(EnsembleError::InvalidConfig(format!(
                    "duplicate model {}",
                    entry.name
                )));
            }
            if !(c.weight > 0.0 && c.weight <= 1.0) {
                return Err(EnsembleError::InvalidConfig(format!(
                    "{}: weight {} outside (0, 1]",
                    entry.name, c.weight
                )));
            }
            if !(c.reliability > 0.0 && c.reliability <= 1.0) {
                return Err(EnsembleError::InvalidConfig(format!(
                    "{}: reliability {} outside (0, 1]",
                    entry.name, c.reliability
                )));
            }
            for (label, t) in [("base", c.base_threshold), ("strict", c.strict_threshold)] {
                if !(t > 0.0 && t < 1.0) {
                    return Err(EnsembleError::InvalidConfig(format!(
                        "{}: {label} threshold {t} outside (0, 1)",
                        entry.name
                    )));
                }
            }
        }
        if self.ensemble.minimum_models == 0 {
            return Err(EnsembleError::InvalidConfig("minimum_models must be positive".into()));
        }
        if !(self.normalization.cohort_std > 0.0) {
            return Err(EnsembleError::InvalidConfig("cohort_std must be positive".into()));
        }
        if self.context.min_threshold > self.context.max_threshold {
            return Err(EnsembleError::InvalidConfig(
                "min_threshold exceeds max_threshold".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_reference_values() {
        let t = ModelTable::default();
        assert_eq!(t.models.len(), 8);
        let ecapa = t.get("ecapa_voxceleb").unwrap();
        assert_eq!(ecapa.strict_threshold, 0.92);
        assert_eq!(ecapa.weight, 0.25);
        assert_eq!(ecapa.reliability, 0.95);
        let formant = t.get("formant_analysis").unwrap();
        assert_eq!(formant.base_threshold, 0.78);
        assert_eq!(t.ensemble.strict_threshold, 0.96);
        assert_eq!(t.ensemble.minimum_models, 4);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn require_unknown_model() {
        let t = ModelTable::default();
        let err = t.require("wav2vec").unwrap_err();
        assert!(err.to_string().contains("wav2vec"));
    }

    #[test]
    fn yaml_partial_override_keeps_defaults() {
        let yaml = "ensemble:\n  minimum_models: 3\n  strict_threshold: 0.9\n";
        let t = ModelTable::from_yaml(yaml).unwrap();
        assert_eq!(t.ensemble.minimum_models, 3);
        assert_eq!(t.ensemble.strict_threshold, 0.9);
        assert_eq!(t.ensemble.consensus_requirement, 0.90);
        assert_eq!(t.models.len(), 8);
    }

    #[test]
    fn yaml_models_replace_rows() {
        let yaml = "\
models:
  - name: mfcc_cosine
    base_threshold: 0.9
    strict_threshold: 0.95
    weight: 0.5
    reliability_score: 0.8
";
        let t = ModelTable::from_yaml(yaml).unwrap();
        assert_eq!(t.models.len(), 1);
        assert_eq!(t.get("mfcc_cosine").unwrap().reliability, 0.8);
    }

    #[test]
    fn yaml_roundtrip() {
        let t = ModelTable::default();
        let back = ModelTable::from_yaml(&t.to_yaml().unwrap()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn validate_rejects_zero_weight() {
        let mut t = ModelTable::default();
        t.models[0].config.weight = 0.0;
        assert!(matches!(t.validate(), Err(EnsembleError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_duplicates() {
        let mut t = ModelTable::default();
        let dup = t.models[1].clone();
        t.models.push(dup);
        let err = t.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn yaml_parse_error() {
        let err = ModelTable::from_yaml("models: [1, 2").unwrap_err();
        assert!(matches!(err, EnsembleError::Parse(_)));
    }
}

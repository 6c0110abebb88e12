use crate::config::NormalizationConfig;

/// Maps raw similarity scores onto a common `[0, 1]` scale.
///
/// z-normalizes against a fixed reference population, then maps the z value
/// back onto a band centred at 0.5:
///
/// ```text
/// n = clamp(0.5 + (s - mean) / (std + 1e-8) * spread, 0, 1)
/// ```
///
/// With the defaults (mean 0.5, std 0.2, spread 0.2) this is close to the
/// identity on `[0, 1]` and maps cosine -1 to 0.
///
/// No cohort statistics are gathered at runtime; the reference values are
/// static configuration until calibrated against real genuine and impostor
/// pair distributions.
#[derive(Debug, Clone)]
pub struct ScoreNormalizer {
    cfg: NormalizationConfig,
}

impl ScoreNormalizer {
    pub fn new(cfg: NormalizationConfig) -> Self {
        Self { cfg }
    }

    /// Normalizes one raw score. Returns the raw score unchanged when
    /// z-normalization is disabled.
    pub fn normalize(&self, raw: f64) -> f64 {
        if !self.cfg.z_norm_enabled {
            return raw;
        }
        let z = (raw - self.cfg.cohort_mean) / (self.cfg.cohort_std + 1e-8);
        (0.5 + z * self.cfg.spread).clamp(0.0, 1.0)
    }
}

impl Default for ScoreNormalizer {
    fn default() -> Self {
        Self::new(NormalizationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_mean_maps_to_center() {
        let n = ScoreNormalizer::default();
        assert!((n.normalize(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn negative_cosine_clamps_to_zero() {
        let n = ScoreNormalizer::default();
        assert_eq!(n.normalize(-1.0), 0.0);
        assert_eq!(n.normalize(0.0), 0.0);
    }

    #[test]
    fn perfect_match_stays_high() {
        let n = ScoreNormalizer::default();
        let v = n.normalize(1.0);
        assert!(v > 0.9999 && v <= 1.0, "got {v}");
        assert_eq!(n.normalize(3.0), 1.0);
    }

    #[test]
    fn wider_spread_stretches_scores() {
        let n = ScoreNormalizer::new(NormalizationConfig {
            spread: 0.4,
            ..Default::default()
        });
        // z = 0.5, 0.5 + 0.5 * 0.4 = 0.7
        assert!((n.normalize(0.6) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn disabled_returns_raw() {
        let n = ScoreNormalizer::new(NormalizationConfig {
            z_norm_enabled: false,
            ..Default::default()
        });
        assert_eq!(n.normalize(-0.25), -0.25);
    }

    #[test]
    fn monotonic_in_raw_score() {
        let n = ScoreNormalizer::default();
        let mut prev = n.normalize(-1.0);
        for i in -99..=100 {
            let v = n.normalize(i as f64 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }
}

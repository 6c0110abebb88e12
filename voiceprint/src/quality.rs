use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vouch_ensemble::QualityContext;

use crate::AudioSample;

const NEUTRAL_QUALITY: f64 = 0.5;
const MAX_SNR_DB: f64 = 40.0;
const LONG_RECORDING_SECS: f64 = 30.0;

/// Duration requirements for voice samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationPolicy {
    /// Samples shorter than this fail the duration check.
    pub min_secs: f64,
    /// Largest bonus (negative penalty) granted to long recordings.
    pub max_bonus: f64,
    /// Seconds beyond 30 s over which the bonus ramps to `max_bonus`.
    pub bonus_ramp_secs: f64,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            min_secs: 3.0,
            max_bonus: 0.1,
            bonus_ramp_secs: 60.0,
        }
    }
}

/// Outcome of the duration check. A failure never rejects on its own; its
/// penalty raises the ensemble threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationCheck {
    pub passed: bool,
    pub duration_secs: f64,
    /// Positive for short samples, negative (a bonus) for long ones.
    pub penalty: f64,
}

impl DurationPolicy {
    pub fn check(&self, duration_secs: f64) -> DurationCheck {
        let penalty = if duration_secs < self.min_secs {
            (self.min_secs - duration_secs) / self.min_secs
        } else if duration_secs >= LONG_RECORDING_SECS {
            -(self.max_bonus.min((duration_secs - LONG_RECORDING_SECS) / self.bonus_ramp_secs))
        } else {
            0.0
        };
        DurationCheck {
            passed: duration_secs >= self.min_secs,
            duration_secs,
            penalty,
        }
    }
}

/// Quality assessment of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Combined quality in `[0, 1]`.
    pub quality: f64,
    pub snr_db: f64,
    pub dynamic_range_db: f64,
    /// Spectral centroid over 2 kHz, capped at 1.
    pub spectral_score: f64,
    pub duration: DurationCheck,
}

/// Scores samples by SNR, dynamic range and spectral content.
#[derive(Debug, Clone, Default)]
pub struct QualityAssessor {
    policy: DurationPolicy,
}

impl QualityAssessor {
    pub fn new(policy: DurationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DurationPolicy {
        &self.policy
    }

    pub fn assess(&self, sample: &AudioSample) -> QualityReport {
        let samples = sample.samples();
        let snr_db = snr_db(samples);
        let dynamic_range_db = dynamic_range_db(samples);
        let spectral_score = spectral_score(samples, sample.sample_rate());

        let combined = ((snr_db / 20.0).min(1.0) + (dynamic_range_db / 40.0).min(1.0) + spectral_score) / 3.0;
        let quality = if combined.is_finite() {
            combined.clamp(0.0, 1.0)
        } else {
            debug!(snr_db, dynamic_range_db, spectral_score, "quality: non-finite metric, using neutral score");
            NEUTRAL_QUALITY
        };

        QualityReport {
            quality,
            snr_db,
            dynamic_range_db,
            spectral_score,
            duration: self.policy.check(sample.duration_secs()),
        }
    }

    /// Assesses both samples and combines them into a pair context.
    pub fn assess_pair(&self, a: &AudioSample, b: &AudioSample) -> (QualityContext, [QualityReport; 2]) {
        let ra = self.assess(a);
        let rb = self.assess(b);
        let ctx = QualityContext::from_pair(ra.quality, ra.duration.penalty, rb.quality, rb.duration.penalty);
        debug!(
            quality = ctx.quality,
            duration_penalty = ctx.duration_penalty,
            "quality: pair context"
        );
        (ctx, [ra, rb])
    }
}

/// SNR estimate from amplitude deciles, clamped to `[0, 40]` dB.
pub fn snr_db(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut mags: Vec<f64> = samples.iter().map(|s| (*s as f64).abs()).collect();
    mags.sort_by(f64::total_cmp);
    let k = (mags.len() / 10).max(1);
    let noise = mags[..k].iter().sum::<f64>() / k as f64;
    let signal = mags[mags.len() - k..].iter().sum::<f64>() / k as f64;
    if noise <= f64::EPSILON {
        return MAX_SNR_DB;
    }
    let db = 20.0 * (signal / noise).log10();
    if db.is_finite() { db.clamp(0.0, MAX_SNR_DB) } else { 0.0 }
}

/// Peak over mean absolute amplitude in dB. `-inf` for silence.
pub fn dynamic_range_db(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }
    let peak = samples.iter().map(|s| (*s as f64).abs()).fold(0.0, f64::max);
    let mean = samples.iter().map(|s| (*s as f64).abs()).sum::<f64>() / samples.len() as f64;
    20.0 * (peak / (mean + 1e-8)).log10()
}

/// Spectral centroid of the whole buffer over 2 kHz, capped at 1.
/// NaN when the spectrum has no energy.
pub fn spectral_score(samples: &[f32], sample_rate: u32) -> f64 {
    let n = samples.len();
    if n < 2 {
        return f64::NAN;
    }
    let mut buf: Vec<Complex<f64>> = samples.iter().map(|&s| Complex::new(s as f64, 0.0)).collect();
    FftPlanner::<f64>::new().plan_fft_forward(n).process(&mut buf);

    let half = n / 2;
    let bin_hz = sample_rate as f64 / n as f64;
    let (weighted, total) = buf[..half]
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(w, t), (k, c)| {
            let m = c.norm();
            (w + k as f64 * bin_hz * m, t + m)
        });
    if total <= 0.0 {
        return f64::NAN;
    }
    (weighted / total / 2000.0).min(1.0)
}

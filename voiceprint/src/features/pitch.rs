use crate::dsp::{centered_frames, FRAME_SIZE, HOP_SIZE};
use crate::AudioSample;

use super::stats::{excess_kurtosis, mean, median, range, skewness, std_dev};

const FMIN: f64 = 50.0;
const FMAX: f64 = 400.0;
const YIN_THRESHOLD: f64 = 0.1;
const ACF_VOICING: f64 = 0.3;
const MIN_VOICED: usize = 11;
const SILENCE_ENERGY: f64 = 1e-10;

/// Six statistics for each of the two pitch trackers.
pub const PITCH_DIM: usize = 12;

/// F0 statistics from the YIN and autocorrelation trackers.
///
/// A tracker with fewer than 11 voiced frames contributes six zeros.
pub fn extract_pitch(sample: &AudioSample) -> Vec<f64> {
    let sr = sample.sample_rate() as f64;
    let frames = centered_frames(sample.samples(), FRAME_SIZE, HOP_SIZE);
    let lags = LagRange::new(sr);

    let yin: Vec<f64> = frames.iter().filter_map(|f| yin_f0(f, sr, lags)).collect();
    let acf: Vec<f64> = frames.iter().filter_map(|f| acf_f0(f, sr, lags)).collect();

    let mut out = Vec::with_capacity(PITCH_DIM);
    for track in [&yin, &acf] {
        if track.len() < MIN_VOICED {
            out.extend([0.0; 6]);
            continue;
        }
        out.extend([
            mean(track),
            std_dev(track),
            median(track),
            range(track),
            skewness(track),
            excess_kurtosis(track),
        ]);
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct LagRange {
    min: usize,
    max: usize,
}

impl LagRange {
    fn new(sr: f64) -> Self {
        let min = ((sr / FMAX).floor() as usize).max(2);
        let max = ((sr / FMIN).ceil() as usize).min(FRAME_SIZE / 2 - 1);
        Self { min, max }
    }
}

/// Parabolic refinement of an extremum at `i`; returns the fractional offset.
fn parabolic_shift(values: &[f64], i: usize) -> f64 {
    if i == 0 || i + 1 >= values.len() {
        return 0.0;
    }
    let (a, b, c) = (values[i - 1], values[i], values[i + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    (0.5 * (a - c) / denom).clamp(-1.0, 1.0)
}

/// YIN estimate over the first half of the frame.
fn yin_f0(frame: &[f64], sr: f64, lags: LagRange) -> Option<f64> {
    let win = frame.len() / 2;
    if lags.max + 1 > frame.len() - win {
        return None;
    }
    let diff: Vec<f64> = (0..=lags.max + 1)
        .map(|tau| {
            (0..win)
                .map(|j| {
                    let d = frame[j] - frame[j + tau];
                    d * d
                })
                .sum()
        })
        .collect();

    // Cumulative mean normalized difference.
    let mut cmnd = vec![1.0; diff.len()];
    let mut running = 0.0;
    for tau in 1..diff.len() {
        running += diff[tau];
        cmnd[tau] = if running > 0.0 { diff[tau] * tau as f64 / running } else { 1.0 };
    }

    let tau = (lags.min..=lags.max)
        .find(|&t| cmnd[t] < YIN_THRESHOLD && cmnd[t] <= cmnd[t + 1])?;
    let period = tau as f64 + parabolic_shift(&cmnd, tau);
    (period > 0.0).then(|| sr / period)
}

/// Normalized autocorrelation peak picking.
fn acf_f0(frame: &[f64], sr: f64, lags: LagRange) -> Option<f64> {
    let energy: f64 = frame.iter().map(|x| x * x).sum();
    if energy < SILENCE_ENERGY {
        return None;
    }
    let acf: Vec<f64> = (0..=lags.max + 1)
        .map(|tau| {
            frame[..frame.len() - tau]
                .iter()
                .zip(&frame[tau..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / energy
        })
        .collect();

    let (tau, peak) = (lags.min..=lags.max)
        .map(|t| (t, acf[t]))
        .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
    if peak < ACF_VOICING {
        return None;
    }
    let period = tau as f64 + parabolic_shift(&acf, tau);
    (period > 0.0).then(|| sr / period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn harmonic(f0: f64, secs: f64) -> AudioSample {
        let sr = 16000u32;
        let n = (secs * sr as f64) as usize;
        AudioSample::new(
            (0..n)
                .map(|i| {
                    let t = i as f64 / sr as f64;
                    (0.5 * (2.0 * PI * f0 * t).sin() + 0.25 * (2.0 * PI * 2.0 * f0 * t).sin())
                        as f32
                })
                .collect(),
            sr,
        )
    }

    #[test]
    fn tracks_a_steady_voice() {
        let v = extract_pitch(&harmonic(150.0, 1.0));
        assert_eq!(v.len(), PITCH_DIM);
        assert!((v[0] - 150.0).abs() < 3.0, "yin mean {}", v[0]);
        assert!((v[6] - 150.0).abs() < 3.0, "acf mean {}", v[6]);
        assert!(v[1] < 2.0);
    }

    #[test]
    fn silence_is_unvoiced() {
        let v = extract_pitch(&AudioSample::new(vec![0.0; 16000], 16000));
        assert_eq!(v, vec![0.0; PITCH_DIM]);
    }

    #[test]
    fn too_short_is_zero() {
        // 1 + 4000 / 512 = 8 frames, below the voiced minimum.
        let v = extract_pitch(&harmonic(150.0, 0.25));
        assert_eq!(v, vec![0.0; PITCH_DIM]);
    }

    #[test]
    fn lag_range_at_16k() {
        let l = LagRange::new(16000.0);
        assert_eq!((l.min, l.max), (40, 320));
    }

    #[test]
    fn parabola_vertex() {
        // y = (x - 2.25)^2 sampled at 1, 2, 3.
        let v = [1.5625, 0.0625, 0.5625];
        assert!((parabolic_shift(&v, 1) - 0.25).abs() < 1e-12);
    }
}

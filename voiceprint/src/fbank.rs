//! Kaldi-style log mel filterbank.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

/// Analysis window applied to each filterbank frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FbankWindow {
    /// Hamming raised to 0.85, as in Kaldi.
    #[default]
    Povey,
    Hamming,
}

impl FbankWindow {
    fn coefficients(self, n: usize) -> Vec<f64> {
        let hamming = (0..n).map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos());
        match self {
            Self::Povey => hamming.map(|w| w.powf(0.85)).collect(),
            Self::Hamming => hamming.collect(),
        }
    }
}

/// Filterbank parameters. Durations are in seconds so the same config
/// works at any sample rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FbankConfig {
    /// Mel bands (default: 80).
    pub num_mels: usize,
    /// Frame length (default: 0.025 s).
    pub frame_secs: f64,
    /// Frame shift (default: 0.010 s).
    pub shift_secs: f64,
    /// Per-frame pre-emphasis, 0 disables (default: 0.97).
    pub pre_emphasis: f64,
    /// Band energies are clamped to this before the log (default: 1e-10).
    pub energy_floor: f64,
    /// Lowest filter edge in Hz (default: 20).
    pub low_freq: f64,
    /// Highest filter edge in Hz; zero or negative counts down from
    /// Nyquist (default: -400).
    pub high_freq: f64,
    /// Subtract each frame's mean before pre-emphasis (default: true).
    pub remove_dc: bool,
    pub window: FbankWindow,
}

impl Default for FbankConfig {
    fn default() -> Self {
        Self {
            num_mels: 80,
            frame_secs: 0.025,
            shift_secs: 0.010,
            pre_emphasis: 0.97,
            energy_floor: 1e-10,
            low_freq: 20.0,
            high_freq: -400.0,
            remove_dc: true,
            window: FbankWindow::Povey,
        }
    }
}

impl FbankConfig {
    /// Frame length and shift in samples at `sample_rate`.
    pub fn frame_geometry(&self, sample_rate: u32) -> (usize, usize) {
        let sr = sample_rate as f64;
        (
            (self.frame_secs * sr).round() as usize,
            (self.shift_secs * sr).round() as usize,
        )
    }

    /// Upper filter edge resolved against the Nyquist frequency.
    fn upper_edge(&self, sample_rate: u32) -> f64 {
        let nyquist = sample_rate as f64 / 2.0;
        if self.high_freq <= 0.0 {
            nyquist + self.high_freq
        } else {
            self.high_freq.min(nyquist)
        }
    }

    /// DC removal followed by pre-emphasis, in place.
    fn condition(&self, frame: &mut [f64]) {
        if self.remove_dc {
            let mean = frame.iter().sum::<f64>() / frame.len() as f64;
            frame.iter_mut().for_each(|v| *v -= mean);
        }
        let k = self.pre_emphasis;
        if k > 0.0 {
            for i in (1..frame.len()).rev() {
                frame[i] -= k * frame[i - 1];
            }
            frame[0] *= 1.0 - k;
        }
    }
}

/// Log mel energies, `[frames][num_mels]`.
///
/// Frames are not padded: `(len - frame) / shift + 1` of them. `None` when
/// the input is shorter than one frame or the config leaves no usable band.
pub fn compute_fbank(samples: &[f32], sample_rate: u32, cfg: &FbankConfig) -> Option<Vec<Vec<f32>>> {
    let (frame_len, shift) = cfg.frame_geometry(sample_rate);
    let high = cfg.upper_edge(sample_rate);
    if shift == 0 || frame_len < 2 || cfg.num_mels == 0 || high <= cfg.low_freq {
        return None;
    }
    if samples.len() < frame_len {
        return None;
    }

    let n_fft = frame_len.next_power_of_two();
    let window = cfg.window.coefficients(frame_len);
    let bands = mel_filterbank(cfg.num_mels, n_fft, sample_rate, cfg.low_freq, high);
    let fft = FftPlanner::<f64>::new().plan_fft_forward(n_fft);

    let mut frame = vec![0.0f64; frame_len];
    let mut spectrum = vec![Complex::new(0.0f64, 0.0); n_fft];

    let frames = samples
        .windows(frame_len)
        .step_by(shift)
        .map(|chunk| {
            for (dst, &s) in frame.iter_mut().zip(chunk) {
                *dst = s as f64;
            }
            cfg.condition(&mut frame);

            spectrum.fill(Complex::new(0.0, 0.0));
            for ((bin, &x), &w) in spectrum.iter_mut().zip(&frame).zip(&window) {
                bin.re = x * w;
            }
            fft.process(&mut spectrum);

            bands
                .iter()
                .map(|band| {
                    let energy: f64 = band
                        .iter()
                        .map(|&(k, weight)| weight * spectrum[k].norm_sqr())
                        .sum();
                    energy.max(cfg.energy_floor).ln() as f32
                })
                .collect()
        })
        .collect();
    Some(frames)
}

/// Scales `v` to unit L2 norm in place; zero vectors are left alone.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let scale = (1.0 / norm) as f32;
        v.iter_mut().for_each(|x| *x *= scale);
    }
}

pub(crate) fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub(crate) fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular filters snapped to integer FFT bins, stored sparsely as
/// `(bin, weight)` pairs per band.
fn mel_filterbank(
    num_mels: usize,
    n_fft: usize,
    sample_rate: u32,
    low: f64,
    high: f64,
) -> Vec<Vec<(usize, f64)>> {
    let last_bin = n_fft / 2;
    let (mel_lo, mel_hi) = (hz_to_mel(low), hz_to_mel(high));
    let step = (mel_hi - mel_lo) / (num_mels + 1) as f64;

    let edges: Vec<usize> = (0..num_mels + 2)
        .map(|i| {
            let hz = mel_to_hz(mel_lo + i as f64 * step);
            ((hz * n_fft as f64 / sample_rate as f64).floor() as usize).min(last_bin)
        })
        .collect();

    edges
        .windows(3)
        .map(|e| {
            let (lo, mid, hi) = (e[0], e[1], e[2]);
            (lo..=hi)
                .filter_map(|k| {
                    let w = if k < mid {
                        (k - lo) as f64 / (mid - lo) as f64
                    } else if k == mid {
                        if hi > lo { 1.0 } else { 0.0 }
                    } else {
                        (hi - k) as f64 / (hi - mid) as f64
                    };
                    (w > 0.0).then_some((k, w))
                })
                .collect()
        })
        .collect()
}

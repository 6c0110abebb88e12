//! Short-time spectral analysis shared by the feature extractors.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::fbank::{hz_to_mel, mel_to_hz};

pub const FRAME_SIZE: usize = 2048;
pub const HOP_SIZE: usize = 512;

/// Periodic Hann window.
pub fn hann_periodic(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Symmetric Hann window.
pub fn hann_symmetric(n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Maps an index outside `[0, n)` back inside by mirror reflection
/// (edge sample not repeated).
fn reflect_index(mut i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    i = i.rem_euclid(period);
    if i >= n { (period - i) as usize } else { i as usize }
}

/// Splits `samples` into centered frames of `frame_len`, padded by
/// reflection on both sides. Yields `1 + len / hop` frames.
pub fn centered_frames(samples: &[f32], frame_len: usize, hop: usize) -> Vec<Vec<f64>> {
    if samples.is_empty() || frame_len == 0 || hop == 0 {
        return Vec::new();
    }
    let pad = (frame_len / 2) as isize;
    let n = samples.len();
    let num_frames = 1 + n / hop;
    (0..num_frames)
        .map(|f| {
            let start = (f * hop) as isize - pad;
            (0..frame_len as isize)
                .map(|j| samples[reflect_index(start + j, n)] as f64)
                .collect()
        })
        .collect()
}

/// Magnitude spectrogram: `[frames][frame_size / 2 + 1]`.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub magnitudes: Vec<Vec<f64>>,
    pub frame_size: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    /// Hann-windowed, reflect-centered STFT.
    pub fn compute(samples: &[f32], sample_rate: u32, frame_size: usize, hop: usize) -> Self {
        let window = hann_periodic(frame_size);
        let fft = FftPlanner::<f64>::new().plan_fft_forward(frame_size);
        let bins = frame_size / 2 + 1;
        let mut buf = vec![Complex::new(0.0f64, 0.0); frame_size];

        let magnitudes = centered_frames(samples, frame_size, hop)
            .into_iter()
            .map(|frame| {
                for ((dst, x), w) in buf.iter_mut().zip(&frame).zip(&window) {
                    *dst = Complex::new(x * w, 0.0);
                }
                fft.process(&mut buf);
                buf[..bins].iter().map(|c| c.norm()).collect()
            })
            .collect();

        Self {
            magnitudes,
            frame_size,
            sample_rate,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.magnitudes.len()
    }

    /// Center frequency of each bin in Hz.
    pub fn bin_frequencies(&self) -> Vec<f64> {
        let bins = self.frame_size / 2 + 1;
        (0..bins)
            .map(|k| k as f64 * self.sample_rate as f64 / self.frame_size as f64)
            .collect()
    }
}

/// Triangular mel filters evaluated at the exact bin frequencies, so
/// narrow low-frequency bands never collapse to zero width.
/// Returns `[num_mels][frame_size / 2 + 1]` weights.
pub fn mel_filters(num_mels: usize, frame_size: usize, sample_rate: u32, fmin: f64, fmax: f64) -> Vec<Vec<f64>> {
    let bins = frame_size / 2 + 1;
    let mel_low = hz_to_mel(fmin);
    let mel_high = hz_to_mel(fmax);
    let edges: Vec<f64> = (0..num_mels + 2)
        .map(|i| mel_to_hz(mel_low + i as f64 * (mel_high - mel_low) / (num_mels + 1) as f64))
        .collect();

    edges
        .windows(3)
        .map(|e| {
            let (left, center, right) = (e[0], e[1], e[2]);
            (0..bins)
                .map(|k| {
                    let f = k as f64 * sample_rate as f64 / frame_size as f64;
                    let rising = (f - left) / (center - left);
                    let falling = (right - f) / (right - center);
                    rising.min(falling).max(0.0)
                })
                .collect()
        })
        .collect()
}

/// Orthonormal DCT-II, keeping the first `n_out` coefficients.
pub fn dct_ortho(input: &[f64], n_out: usize) -> Vec<f64> {
    let n = input.len() as f64;
    (0..n_out)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos())
                .sum();
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            sum * scale
        })
        .collect()
}

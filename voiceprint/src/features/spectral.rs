use std::f64::consts::PI;

use crate::dsp::{centered_frames, Spectrogram, FRAME_SIZE, HOP_SIZE};
use crate::AudioSample;

use super::stats::{mean, mean_std_columns, std_dev};

const ROLLOFF: f64 = 0.85;
const CONTRAST_BANDS: usize = 6;
const CONTRAST_FMIN: f64 = 200.0;
const CONTRAST_QUANTILE: f64 = 0.02;
const CHROMA_BINS: usize = 12;
const TONNETZ_DIMS: usize = 6;

/// centroid, rolloff, bandwidth, zcr (mean + std each), 7 contrast bands,
/// 12 chroma bins and 6 tonnetz coordinates (mean + std each).
pub const SPECTRAL_DIM: usize = 4 * 2 + (CONTRAST_BANDS + 1) * 2 + CHROMA_BINS * 2 + TONNETZ_DIMS * 2;

/// Spectral shape and harmonic content statistics of one sample.
pub fn extract_spectral(sample: &AudioSample) -> Vec<f64> {
    let spec = Spectrogram::compute(sample.samples(), sample.sample_rate(), FRAME_SIZE, HOP_SIZE);
    let freqs = spec.bin_frequencies();

    let mut centroids = Vec::with_capacity(spec.num_frames());
    let mut rolloffs = Vec::with_capacity(spec.num_frames());
    let mut bandwidths = Vec::with_capacity(spec.num_frames());
    let mut contrast = Vec::with_capacity(spec.num_frames());
    let mut chroma = Vec::with_capacity(spec.num_frames());
    let mut tonnetz = Vec::with_capacity(spec.num_frames());

    for frame in &spec.magnitudes {
        let (c, b) = centroid_bandwidth(frame, &freqs);
        centroids.push(c);
        bandwidths.push(b);
        rolloffs.push(rolloff(frame, &freqs));
        contrast.push(band_contrast(frame, &freqs));
        let ch = chroma_frame(frame, &freqs);
        tonnetz.push(tonnetz_frame(&ch));
        chroma.push(ch);
    }

    let zcr: Vec<f64> = centered_frames(sample.samples(), FRAME_SIZE, HOP_SIZE)
        .iter()
        .map(|f| zero_crossing_rate(f))
        .collect();

    let mut out = Vec::with_capacity(SPECTRAL_DIM);
    for series in [&centroids, &rolloffs, &bandwidths, &zcr] {
        out.push(mean(series));
        out.push(std_dev(series));
    }
    mean_std_columns(&contrast, CONTRAST_BANDS + 1, &mut out);
    mean_std_columns(&chroma, CHROMA_BINS, &mut out);
    mean_std_columns(&tonnetz, TONNETZ_DIMS, &mut out);
    out
}

fn centroid_bandwidth(frame: &[f64], freqs: &[f64]) -> (f64, f64) {
    let total: f64 = frame.iter().sum();
    if total <= 0.0 {
        return (0.0, 0.0);
    }
    let centroid = frame.iter().zip(freqs).map(|(m, f)| m * f).sum::<f64>() / total;
    let spread = frame
        .iter()
        .zip(freqs)
        .map(|(m, f)| m / total * (f - centroid).powi(2))
        .sum::<f64>();
    (centroid, spread.sqrt())
}

fn rolloff(frame: &[f64], freqs: &[f64]) -> f64 {
    let total: f64 = frame.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let target = ROLLOFF * total;
    let mut acc = 0.0;
    for (m, f) in frame.iter().zip(freqs) {
        acc += m;
        if acc >= target {
            return *f;
        }
    }
    freqs.last().copied().unwrap_or(0.0)
}

/// Fraction of adjacent sample pairs that change sign.
fn zero_crossing_rate(frame: &[f64]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / frame.len() as f64
}

/// Peak-to-valley contrast in dB for octave bands starting at 200 Hz; the
/// last band extends to Nyquist.
fn band_contrast(frame: &[f64], freqs: &[f64]) -> Vec<f64> {
    let mut edges = vec![0.0];
    edges.extend((0..CONTRAST_BANDS).map(|k| CONTRAST_FMIN * 2f64.powi(k as i32)));
    edges.push(f64::INFINITY);

    edges
        .windows(2)
        .map(|e| {
            let mut band: Vec<f64> = frame
                .iter()
                .zip(freqs)
                .filter(|&(_, &f)| f >= e[0] && f < e[1])
                .map(|(&m, _)| m)
                .collect();
            if band.is_empty() {
                return 0.0;
            }
            band.sort_by(f64::total_cmp);
            let k = ((CONTRAST_QUANTILE * band.len() as f64).round() as usize).max(1);
            let valley = mean(&band[..k]);
            let peak = mean(&band[band.len() - k..]);
            10.0 * (peak + 1e-10).log10() - 10.0 * (valley + 1e-10).log10()
        })
        .collect()
}

/// Energy per pitch class (C = 0), normalized to a maximum of 1.
fn chroma_frame(frame: &[f64], freqs: &[f64]) -> Vec<f64> {
    let mut chroma = vec![0.0; CHROMA_BINS];
    for (m, &f) in frame.iter().zip(freqs) {
        if f <= 0.0 {
            continue;
        }
        let semitone = (12.0 * (f / 440.0).log2()).round() as i64 + 9;
        chroma[semitone.rem_euclid(CHROMA_BINS as i64) as usize] += m * m;
    }
    let max = chroma.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        chroma.iter_mut().for_each(|c| *c /= max);
    }
    chroma
}

/// Tonal centroid: projects L1-normalized chroma onto the circles of
/// fifths, minor thirds and major thirds.
fn tonnetz_frame(chroma: &[f64]) -> Vec<f64> {
    let total: f64 = chroma.iter().sum();
    if total <= 0.0 {
        return vec![0.0; TONNETZ_DIMS];
    }
    let axes = [(7.0 * PI / 6.0, 1.0), (3.0 * PI / 2.0, 1.0), (2.0 * PI / 3.0, 0.5)];
    let mut out = Vec::with_capacity(TONNETZ_DIMS);
    for (step, radius) in axes {
        let (mut s, mut c) = (0.0, 0.0);
        for (l, &v) in chroma.iter().enumerate() {
            let angle = l as f64 * step;
            s += radius * angle.sin() * v / total;
            c += radius * angle.cos() * v / total;
        }
        out.push(s);
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, secs: f64) -> AudioSample {
        let sr = 16000u32;
        let n = (secs * sr as f64) as usize;
        AudioSample::new(
            (0..n)
                .map(|i| (0.5 * (2.0 * PI * freq * i as f64 / sr as f64).sin()) as f32)
                .collect(),
            sr,
        )
    }

    #[test]
    fn dimension() {
        let v = extract_spectral(&sine(440.0, 1.0));
        assert_eq!(v.len(), SPECTRAL_DIM);
        assert_eq!(SPECTRAL_DIM, 58);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn centroid_tracks_frequency() {
        let low = extract_spectral(&sine(300.0, 1.0));
        let high = extract_spectral(&sine(3000.0, 1.0));
        assert!(high[0] > low[0]);
        assert!((low[0] - 300.0).abs() < 100.0, "centroid {}", low[0]);
    }

    #[test]
    fn chroma_of_a440() {
        let freqs: Vec<f64> = (0..5).map(|k| k as f64 * 220.0).collect();
        let frame = [0.0, 0.0, 1.0, 0.0, 0.0];
        let ch = chroma_frame(&frame, &freqs);
        assert_eq!(ch[9], 1.0);
        assert_eq!(ch.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn silence_is_all_zero() {
        let v = extract_spectral(&AudioSample::new(vec![0.0; 16000], 16000));
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn zcr_of_alternating_signal() {
        let f: Vec<f64> = (0..8).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert_eq!(zero_crossing_rate(&f), 7.0 / 8.0);
    }
}

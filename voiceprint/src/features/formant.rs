use crate::dsp::hann_symmetric;
use crate::AudioSample;

use super::stats::{mean, std_dev};

const FRAME_SECS: f64 = 0.025;
const HOP_SECS: f64 = 0.010;
const MIN_ENERGY: f64 = 0.01;
const PEAK_HEIGHT: f64 = 0.1;

/// Mean and std of three resonance estimates plus two mean ratios.
pub const FORMANT_DIM: usize = 8;

/// Resonance estimates from autocorrelation peaks.
///
/// Yields eight zeros when no frame has three usable peaks, as with a
/// low-pitched voice carrying few harmonics. The all-zero vector has no
/// cosine with anything, so `formant_analysis` is left out of the ensemble
/// for that pair and the remaining models must still reach the minimum
/// model count.
pub fn extract_formant(sample: &AudioSample) -> Vec<f64> {
    let sr = sample.sample_rate() as f64;
    let frame_len = (sr * FRAME_SECS) as usize;
    let hop = ((sr * HOP_SECS) as usize).max(1);
    let samples = sample.samples();
    if frame_len < 4 || samples.len() <= frame_len {
        return vec![0.0; FORMANT_DIM];
    }
    let window = hann_symmetric(frame_len);

    let mut tracks: [Vec<f64>; 3] = Default::default();
    for start in (0..samples.len() - frame_len).step_by(hop) {
        let frame: Vec<f64> = samples[start..start + frame_len]
            .iter()
            .zip(&window)
            .map(|(&x, w)| x as f64 * w)
            .collect();
        if frame.iter().map(|x| x * x).sum::<f64>() < MIN_ENERGY {
            continue;
        }
        let peaks = autocorrelation_peaks(&frame);
        if peaks.len() < 3 {
            continue;
        }
        for (track, &p) in tracks.iter_mut().zip(&peaks) {
            track.push(p as f64 * sr / frame_len as f64);
        }
    }

    if tracks[0].is_empty() {
        return vec![0.0; FORMANT_DIM];
    }

    let mut out = Vec::with_capacity(FORMANT_DIM);
    out.extend(tracks.iter().map(|t| mean(t)));
    out.extend(tracks.iter().map(|t| std_dev(t)));
    let ratio = |k: usize| -> f64 {
        let r: Vec<f64> = tracks[k].iter().zip(&tracks[0]).map(|(a, b)| a / b).collect();
        mean(&r)
    };
    out.push(ratio(1));
    out.push(ratio(2));
    out
}

/// Positions of local maxima in the positive-lag autocorrelation (lag 1
/// is index 0) that reach 10 % of the lag-0 value. Returns at most three.
fn autocorrelation_peaks(frame: &[f64]) -> Vec<usize> {
    let n = frame.len();
    let acf: Vec<f64> = (1..n)
        .map(|lag| frame[..n - lag].iter().zip(&frame[lag..]).map(|(a, b)| a * b).sum())
        .collect();
    let zero_lag: f64 = frame.iter().map(|x| x * x).sum();
    let height = PEAK_HEIGHT * zero_lag;

    (1..acf.len().saturating_sub(1))
        .filter(|&i| acf[i] > acf[i - 1] && acf[i] >= acf[i + 1] && acf[i] >= height)
        .take(3)
        .collect()
}

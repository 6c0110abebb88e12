use crate::dsp::{dct_ortho, mel_filters, Spectrogram, FRAME_SIZE, HOP_SIZE};
use crate::AudioSample;

use super::stats::{mean, median, std_dev};

const NUM_MFCC: usize = 13;
const NUM_MELS: usize = 128;
const DELTA_WIDTH: usize = 9;
const TOP_DB: f64 = 80.0;
const AMIN: f64 = 1e-10;

/// 13 MFCCs plus first and second deltas, each summarized by mean, std and
/// median.
pub const CEPSTRAL_DIM: usize = NUM_MFCC * 3 * 3;

/// MFCC statistics of one sample.
///
/// Fails when the sample yields fewer frames than the delta window needs.
pub fn extract_cepstral(sample: &AudioSample) -> Result<Vec<f64>, String> {
    let spec = Spectrogram::compute(sample.samples(), sample.sample_rate(), FRAME_SIZE, HOP_SIZE);
    if spec.num_frames() < DELTA_WIDTH {
        return Err(format!(
            "{} frames, need at least {DELTA_WIDTH}",
            spec.num_frames()
        ));
    }

    let mfcc = mfcc(&spec);
    let delta1 = delta(&mfcc);
    let delta2 = delta(&delta1);

    let rows: Vec<&Vec<f64>> = mfcc.iter().chain(&delta1).chain(&delta2).collect();
    let mut out = Vec::with_capacity(CEPSTRAL_DIM);
    out.extend(rows.iter().map(|r| mean(r)));
    out.extend(rows.iter().map(|r| std_dev(r)));
    out.extend(rows.iter().map(|r| median(r)));
    Ok(out)
}

/// MFCC matrix as `[coefficient][frame]`.
fn mfcc(spec: &Spectrogram) -> Vec<Vec<f64>> {
    let nyquist = spec.sample_rate as f64 / 2.0;
    let filters = mel_filters(NUM_MELS, spec.frame_size, spec.sample_rate, 0.0, nyquist);

    let mut log_mel: Vec<Vec<f64>> = spec
        .magnitudes
        .iter()
        .map(|frame| {
            filters
                .iter()
                .map(|filter| {
                    let power: f64 = filter.iter().zip(frame).map(|(w, m)| w * m * m).sum();
                    10.0 * power.max(AMIN).log10()
                })
                .collect()
        })
        .collect();

    let peak = log_mel
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = peak - TOP_DB;
    log_mel
        .iter_mut()
        .flatten()
        .for_each(|v| *v = v.max(floor));

    let per_frame: Vec<Vec<f64>> = log_mel.iter().map(|f| dct_ortho(f, NUM_MFCC)).collect();
    (0..NUM_MFCC)
        .map(|c| per_frame.iter().map(|f| f[c]).collect())
        .collect()
}

/// Regression deltas over a 9-frame window, replicating edge frames.
fn delta(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let half = (DELTA_WIDTH / 2) as isize;
    let denom: f64 = 2.0 * (1..=half).map(|n| (n * n) as f64).sum::<f64>();
    rows.iter()
        .map(|row| {
            let last = row.len() as isize - 1;
            let at = |i: isize| row[i.clamp(0, last) as usize];
            (0..=last)
                .map(|t| {
                    (1..=half)
                        .map(|n| n as f64 * (at(t + n) - at(t - n)))
                        .sum::<f64>()
                        / denom
                })
                .collect()
        })
        .collect()
}

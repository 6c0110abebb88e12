//! Model-free [`EmbeddingModel`] built on log mel filterbank statistics.

use crate::error::VoiceprintError;
use crate::fbank::{compute_fbank, l2_normalize, FbankConfig};
use crate::model::EmbeddingModel;
use crate::AudioSample;

/// Ensemble name of the filterbank baseline.
pub const FBANK_EMBEDDING_MODEL: &str = "fbank_embedding";

/// Number of fbank frames per pooling segment.
/// 300 frames = 3 seconds at 10ms hop.
const SEG_FRAMES: usize = 300;

/// Hop between segments for averaging.
const HOP_FRAMES: usize = 150;

/// [`EmbeddingModel`] that pools log mel filterbank statistics.
///
/// # Pipeline
///
/// 1. Audio -> [`compute_fbank`] -> log mel energies
/// 2. Segment pooling (300-frame windows, 150-frame hop): per-bin mean and
///    standard deviation
/// 3. Average segment vectors + L2 normalize
///
/// The embedding has `2 * num_mels` dimensions. It needs no weights and is
/// always available.
#[derive(Debug, Clone, Default)]
pub struct FbankEmbeddingModel {
    cfg: FbankConfig,
}

impl FbankEmbeddingModel {
    pub fn new(cfg: FbankConfig) -> Self {
        Self { cfg }
    }
}

impl EmbeddingModel for FbankEmbeddingModel {
    fn embed(&self, sample: &AudioSample) -> Result<Vec<f32>, VoiceprintError> {
        let (frame_length, _) = self.cfg.frame_geometry(sample.sample_rate());
        let features = compute_fbank(sample.samples(), sample.sample_rate(), &self.cfg)
            .filter(|f| !f.is_empty())
            .ok_or(VoiceprintError::AudioTooShort {
                min_samples: frame_length,
                got_samples: sample.len(),
            })?;

        let num_frames = features.len();
        let dim = self.dimension();
        if num_frames <= SEG_FRAMES {
            let mut emb = pool_segment(&features, dim);
            l2_normalize(&mut emb);
            return Ok(emb);
        }

        // Long audio: sliding window, average all segment vectors.
        let mut segments: Vec<Vec<f32>> = Vec::new();
        let mut last_start = 0;
        let mut start = 0;
        while start + SEG_FRAMES <= num_frames {
            segments.push(pool_segment(&features[start..start + SEG_FRAMES], dim));
            last_start = start;
            start += HOP_FRAMES;
        }

        // Ensure the last segment covers the end of the audio.
        let tail = num_frames - SEG_FRAMES;
        if tail > last_start {
            segments.push(pool_segment(&features[tail..], dim));
        }

        let mut avg = vec![0.0f32; dim];
        for seg in &segments {
            for (a, &v) in avg.iter_mut().zip(seg) {
                *a += v;
            }
        }
        let n = segments.len() as f32;
        avg.iter_mut().for_each(|a| *a /= n);
        l2_normalize(&mut avg);

        if avg.iter().any(|v| !v.is_finite()) {
            return Err(VoiceprintError::Model("non-finite fbank embedding".into()));
        }
        Ok(avg)
    }

    fn dimension(&self) -> usize {
        self.cfg.num_mels * 2
    }
}

/// Per-bin mean followed by per-bin standard deviation.
fn pool_segment(frames: &[Vec<f32>], dim: usize) -> Vec<f32> {
    let num_mels = dim / 2;
    let t = frames.len() as f64;
    let mut out = vec![0.0f32; dim];
    for m in 0..num_mels {
        let mean = frames.iter().map(|f| f[m] as f64).sum::<f64>() / t;
        let var = frames
            .iter()
            .map(|f| {
                let d = f[m] as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / t;
        out[m] = mean as f32;
        out[num_mels + m] = var.sqrt() as f32;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn voiced(f0: f64, secs: f64) -> AudioSample {
        let sr = 16000u32;
        let n = (secs * sr as f64) as usize;
        AudioSample::new(
            (0..n)
                .map(|i| {
                    let t = i as f64 / sr as f64;
                    (0.4 * (2.0 * PI * f0 * t).sin() + 0.1 * (2.0 * PI * 3.0 * f0 * t).sin()) as f32
                })
                .collect(),
            sr,
        )
    }

    fn norm(v: &[f32]) -> f64 {
        v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
    }

    #[test]
    fn short_audio_single_segment() {
        let model = FbankEmbeddingModel::default();
        let emb = model.embed(&voiced(150.0, 1.0)).unwrap();
        assert_eq!(emb.len(), 160);
        assert_eq!(model.dimension(), 160);
        assert!((norm(&emb) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn long_audio_segments_are_averaged() {
        let model = FbankEmbeddingModel::default();
        // (80000 - 400) / 160 + 1 = 498 frames: segments at 0 and 150, tail at 198.
        let emb = model.embed(&voiced(150.0, 5.0)).unwrap();
        assert_eq!(emb.len(), 160);
        assert!((norm(&emb) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn deterministic() {
        let model = FbankEmbeddingModel::default();
        let s = voiced(120.0, 4.0);
        assert_eq!(model.embed(&s).unwrap(), model.embed(&s).unwrap());
    }

    #[test]
    fn too_short() {
        let model = FbankEmbeddingModel::default();
        let err = model.embed(&AudioSample::new(vec![0.1; 100], 16000)).unwrap_err();
        assert!(matches!(
            err,
            VoiceprintError::AudioTooShort {
                min_samples: 400,
                got_samples: 100
            }
        ));
    }
}

use crate::VoiceprintError;

/// A mono audio buffer at a fixed sample rate.
///
/// Amplitudes are nominally in `[-1, 1]`. The buffer is immutable once
/// built; [`AudioSample::validate`] checks it before any scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSample {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decodes PCM16 signed little-endian mono audio, scaled by 1/32768.
    pub fn from_pcm16_le(audio: &[u8], sample_rate: u32) -> Result<Self, VoiceprintError> {
        if audio.len() % 2 != 0 {
            return Err(VoiceprintError::InvalidSample(format!(
                "PCM16 data has odd length {}",
                audio.len()
            )));
        }
        let samples = audio
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
            .collect();
        Ok(Self::new(samples, sample_rate))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Rejects empty buffers, a zero sample rate and non-finite amplitudes.
    pub fn validate(&self) -> Result<(), VoiceprintError> {
        if self.sample_rate == 0 {
            return Err(VoiceprintError::InvalidSample("sample rate is zero".into()));
        }
        if self.samples.is_empty() {
            return Err(VoiceprintError::InvalidSample("no samples".into()));
        }
        if let Some(i) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(VoiceprintError::InvalidSample(format!(
                "non-finite amplitude at index {i}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm16_decoding() {
        let bytes = [0x00, 0x40, 0x00, 0xC0, 0xFF, 0x7F];
        let s = AudioSample::from_pcm16_le(&bytes, 16000).unwrap();
        assert_eq!(s.samples(), &[0.5, -0.5, 32767.0 / 32768.0]);
        assert_eq!(s.sample_rate(), 16000);
    }

    #[test]
    fn pcm16_odd_length() {
        assert!(AudioSample::from_pcm16_le(&[0, 0, 0], 16000).is_err());
    }

    #[test]
    fn duration() {
        let s = AudioSample::new(vec![0.0; 8000], 16000);
        assert_eq!(s.duration_secs(), 0.5);
        assert_eq!(AudioSample::new(vec![0.0; 10], 0).duration_secs(), 0.0);
    }

    #[test]
    fn validation() {
        assert!(AudioSample::new(vec![0.1; 10], 16000).validate().is_ok());
        assert!(AudioSample::new(Vec::new(), 16000).validate().is_err());
        assert!(AudioSample::new(vec![0.1; 10], 0).validate().is_err());
        let err = AudioSample::new(vec![0.0, f32::NAN], 16000).validate().unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }
}

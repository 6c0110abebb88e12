//! Voice verification command.

use std::fs;

use anyhow::Context;
use clap::Args;
use tracing::info;
use vouch_voiceprint::{AudioSample, ModelRegistry, VerificationMode, Verifier, VerifierOptions};

use super::{load_model_table, output_result};
use crate::Cli;

/// Verify two raw little-endian PCM16 mono recordings.
#[derive(Args)]
pub struct VoiceCommand {
    /// Stored (enrolled) recording
    stored: String,

    /// Probe recording
    probe: String,

    /// Duration preset (strict, standard, lightweight)
    #[arg(long, default_value = "standard")]
    mode: VerificationMode,

    /// Override the preset's minimum duration, in seconds
    #[arg(long)]
    min_duration: Option<f64>,

    /// Sample rate of both recordings
    #[arg(long, default_value_t = 16000)]
    sample_rate: u32,

    /// Run the two-feature simplified check instead of the ensemble
    #[arg(long)]
    simplified: bool,

    /// Leave out the filterbank embedding baseline
    #[arg(long)]
    no_fbank_model: bool,
}

impl VoiceCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let table = load_model_table(cli)?;
        let registry = if self.no_fbank_model {
            ModelRegistry::empty()
        } else {
            ModelRegistry::new()
        };
        let options = VerifierOptions {
            mode: self.mode,
            min_duration_secs: self.min_duration,
            expected_sample_rate: Some(self.sample_rate),
        };
        let verifier = Verifier::new(table, registry, options)?;

        let stored = self.load(&self.stored)?;
        let probe = self.load(&self.probe)?;
        info!(
            stored_secs = stored.duration_secs(),
            probe_secs = probe.duration_secs(),
            models = ?verifier.available_models(),
            "verifying voice"
        );

        if self.simplified {
            let verdict = verifier.verify_simplified(&stored, &probe)?;
            return output_result(cli, &verdict);
        }
        let outcome = verifier.verify(&stored, &probe)?;
        output_result(cli, &outcome)
    }

    fn load(&self, path: &str) -> anyhow::Result<AudioSample> {
        let data = fs::read(path).with_context(|| format!("read {path}"))?;
        AudioSample::from_pcm16_le(&data, self.sample_rate).with_context(|| format!("decode {path}"))
    }
}

//! Model table listing.

use clap::Args;
use serde::Serialize;
use vouch_voiceprint::{FeatureKind, ModelRegistry, Verifier, VerifierOptions};

use super::{load_model_table, output_result};
use crate::Cli;

/// List the voice model table and which models can run.
#[derive(Args)]
pub struct ModelsCommand {
    /// Leave out the filterbank embedding baseline
    #[arg(long)]
    no_fbank_model: bool,
}

#[derive(Serialize)]
struct ModelRow<'a> {
    name: &'a str,
    kind: &'static str,
    weight: f64,
    reliability: f64,
    strict_threshold: f64,
    available: bool,
}

impl ModelsCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let table = load_model_table(cli)?;
        let registry = if self.no_fbank_model {
            ModelRegistry::empty()
        } else {
            ModelRegistry::new()
        };
        let verifier = Verifier::new(table, registry, VerifierOptions::default())?;
        let available = verifier.available_models();

        let rows: Vec<ModelRow<'_>> = verifier
            .table()
            .models
            .iter()
            .map(|entry| ModelRow {
                name: &entry.name,
                kind: if FeatureKind::from_model_name(&entry.name).is_some() {
                    "feature"
                } else {
                    "embedding"
                },
                weight: entry.config.weight,
                reliability: entry.config.reliability,
                strict_threshold: entry.config.strict_threshold,
                available: available.contains(&entry.name.as_str()),
            })
            .collect();
        output_result(cli, &rows)
    }
}

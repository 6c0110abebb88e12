//! Face verification command.

use std::fs;

use anyhow::Context;
use clap::Args;
use vouch_facematch::{DetectedFace, FaceMatchConfig, FaceMatcher};

use super::{load_yaml_or_default, output_result};
use crate::Cli;

/// Verify two JSON files of detected faces.
///
/// Each file holds an array of `{"bbox": [x1, y1, x2, y2], "detScore": s,
/// "embedding": [...]}` records.
#[derive(Args)]
pub struct FaceCommand {
    /// Faces detected in the stored image
    stored: String,

    /// Faces detected in the probe image
    probe: String,
}

impl FaceCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config: FaceMatchConfig = load_yaml_or_default(cli)?;
        let matcher = FaceMatcher::new(config)?;

        let stored = load_faces(&self.stored)?;
        let probe = load_faces(&self.probe)?;
        let outcome = matcher.verify_faces(&stored, &probe);
        output_result(cli, &outcome)
    }
}

fn load_faces(path: &str) -> anyhow::Result<Vec<DetectedFace>> {
    let data = fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    serde_json::from_str(&data).with_context(|| format!("parse faces {path}"))
}

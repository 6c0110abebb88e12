//! Config loading and result output shared by commands.

use std::fs;

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use vouch_ensemble::ModelTable;

use crate::Cli;

/// Writes `value` as pretty JSON (or YAML with `--yaml`) to the output
/// file or stdout.
pub fn output_result<T: Serialize>(cli: &Cli, value: &T) -> anyhow::Result<()> {
    let text = if cli.yaml {
        serde_yaml::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };

    match &cli.output {
        Some(path) => fs::write(path, text).with_context(|| format!("write {path}"))?,
        None => println!("{text}"),
    }
    Ok(())
}

/// Loads the voice model table from `--config`, or the built-in defaults.
pub fn load_model_table(cli: &Cli) -> anyhow::Result<ModelTable> {
    match &cli.config {
        Some(path) => {
            let data = fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
            let table =
                ModelTable::from_yaml(&data).with_context(|| format!("parse model table {path}"))?;
            table.validate().with_context(|| format!("validate model table {path}"))?;
            Ok(table)
        }
        None => Ok(ModelTable::default()),
    }
}

/// Loads a YAML config section from `--config`, or its defaults.
pub fn load_yaml_or_default<T: DeserializeOwned + Default>(cli: &Cli) -> anyhow::Result<T> {
    match &cli.config {
        Some(path) => {
            let data = fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
            serde_yaml::from_str(&data).with_context(|| format!("parse config {path}"))
        }
        None => Ok(T::default()),
    }
}

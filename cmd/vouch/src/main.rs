//! vouch - verify voice and face samples from the command line.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{FaceCommand, ModelsCommand, VoiceCommand};

/// vouch - multi-model biometric verification.
///
/// Voice verification scores a stored and a probe recording with an
/// ensemble of feature and embedding models. Face verification compares
/// detected faces and their embeddings.
#[derive(Parser)]
#[command(name = "vouch")]
#[command(about = "Multi-model voice and face verification")]
#[command(version)]
pub struct Cli {
    /// Config file (YAML). Voice reads a model table, face reads thresholds.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as YAML instead of JSON
    #[arg(long, global = true)]
    pub yaml: bool,

    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify two raw PCM16 recordings
    Voice(VoiceCommand),
    /// Verify two sets of detected faces
    Face(FaceCommand),
    /// List the voice model table
    Models(ModelsCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Voice(cmd) => cmd.run(&cli),
        Commands::Face(cmd) => cmd.run(&cli),
        Commands::Models(cmd) => cmd.run(&cli),
    }
}

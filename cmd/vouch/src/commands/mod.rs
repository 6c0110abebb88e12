//! CLI commands module.

mod face;
mod models;
mod output;
mod voice;

pub use face::FaceCommand;
pub use models::ModelsCommand;
pub use voice::VoiceCommand;

pub(crate) use output::*;

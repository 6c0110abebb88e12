use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{AudioSample, VoiceprintError};

/// Computes speaker embeddings from audio.
///
/// Implementations wrap pretrained networks (ECAPA, x-vector, ...) or
/// model-free baselines such as [`FbankEmbeddingModel`](crate::FbankEmbeddingModel).
/// The output is a dense f32 vector whose dimensionality is returned by
/// [`EmbeddingModel::dimension`].
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use; the verifier may score
/// several models at once.
pub trait EmbeddingModel: Send + Sync {
    /// Computes a speaker embedding for one sample.
    fn embed(&self, sample: &AudioSample) -> Result<Vec<f32>, VoiceprintError>;

    /// Returns the dimensionality of the embedding vectors (e.g., 192).
    fn dimension(&self) -> usize;
}

/// How two embeddings of one model are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    /// Euclidean distance `d` mapped to `1 / (1 + d)`.
    Euclidean,
}

/// Availability of one embedding model, decided once at startup.
#[derive(Clone)]
pub enum ModelHandle {
    Loaded(Arc<dyn EmbeddingModel>, SimilarityMetric),
    Unavailable,
}

impl ModelHandle {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(..))
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(m, metric) => f
                .debug_struct("Loaded")
                .field("dimension", &m.dimension())
                .field("metric", metric)
                .finish(),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Read-only map from model name to embedding model handle.
///
/// Built once by the caller and handed to the verifier. Names without an
/// entry resolve to [`ModelHandle::Unavailable`].
///
/// The default registry loads the model-free `fbank_embedding` baseline.
/// Together with the four feature models that gives five voters, enough to
/// accept identical input without any pretrained network. Start from
/// [`ModelRegistry::empty`] to run the feature models alone.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    handles: HashMap<String, ModelHandle>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::empty().with_model(
            crate::FBANK_EMBEDDING_MODEL,
            Arc::new(crate::FbankEmbeddingModel::default()),
            SimilarityMetric::Cosine,
        )
    }
}

impl ModelRegistry {
    /// Registry holding the `fbank_embedding` baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no embedding models loaded.
    pub fn empty() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    pub fn with_model(
        mut self,
        name: impl Into<String>,
        model: Arc<dyn EmbeddingModel>,
        metric: SimilarityMetric,
    ) -> Self {
        self.handles.insert(name.into(), ModelHandle::Loaded(model, metric));
        self
    }

    /// Records a model that failed to load.
    pub fn with_unavailable(mut self, name: impl Into<String>) -> Self {
        self.handles.insert(name.into(), ModelHandle::Unavailable);
        self
    }

    pub fn handle(&self, name: &str) -> ModelHandle {
        self.handles.get(name).cloned().unwrap_or(ModelHandle::Unavailable)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.handles.get(name).is_some_and(ModelHandle::is_loaded)
    }

    /// Names of loaded models, sorted.
    pub fn loaded(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .handles
            .iter()
            .filter(|(_, h)| h.is_loaded())
            .map(|(n, _)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f32>);

    impl EmbeddingModel for Fixed {
        fn embed(&self, _: &AudioSample) -> Result<Vec<f32>, VoiceprintError> {
            Ok(self.0.clone())
        }
        fn dimension(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn registry_lookup() {
        let reg = ModelRegistry::empty()
            .with_model("xvector", Arc::new(Fixed(vec![1.0, 0.0])), SimilarityMetric::Euclidean)
            .with_unavailable("ecapa_voxceleb");

        assert!(reg.is_loaded("xvector"));
        assert!(!reg.is_loaded("ecapa_voxceleb"));
        assert!(!reg.is_loaded("missing"));
        assert!(matches!(reg.handle("missing"), ModelHandle::Unavailable));
        match reg.handle("xvector") {
            ModelHandle::Loaded(m, metric) => {
                assert_eq!(m.dimension(), 2);
                assert_eq!(metric, SimilarityMetric::Euclidean);
            }
            ModelHandle::Unavailable => panic!("xvector should be loaded"),
        }
        assert_eq!(reg.loaded(), vec!["xvector"]);
    }

    #[test]
    fn default_registry_loads_baseline() {
        assert_eq!(ModelRegistry::new().loaded(), vec!["fbank_embedding"]);
        assert_eq!(ModelRegistry::default().loaded(), vec!["fbank_embedding"]);
        assert!(ModelRegistry::empty().loaded().is_empty());
    }

    #[test]
    fn handle_debug() {
        let h = ModelHandle::Loaded(Arc::new(Fixed(vec![0.0; 3])), SimilarityMetric::Cosine);
        assert_eq!(format!("{h:?}"), "Loaded { dimension: 3, metric: Cosine }");
    }
}

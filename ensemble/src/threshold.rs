use crate::config::{ContextAdjustments, ModelConfig, ModelTable};
use crate::error::EnsembleError;
use crate::quality::QualityContext;

/// Returns the decision threshold for one model under the given context.
///
/// Starts from the model's strict threshold. Clean input (quality at or above
/// the high cutoff) lowers it, noisy input (quality at or below the low
/// cutoff) raises it, and the result is clamped to
/// `[min_threshold, max_threshold]`. Without a context the strict threshold
/// is returned as is.
pub fn adaptive_threshold(
    model: &ModelConfig,
    adjustments: &ContextAdjustments,
    ctx: Option<&QualityContext>,
) -> f64 {
    let base = model.strict_threshold;
    let Some(ctx) = ctx else {
        return base;
    };

    let mut adjustment = 0.0;
    if ctx.quality >= adjustments.high_quality_cutoff {
        adjustment += adjustments.high_quality_bonus;
    } else if ctx.quality <= adjustments.low_quality_cutoff {
        adjustment += adjustments.low_quality_penalty;
    }

    (base + adjustment).clamp(adjustments.min_threshold, adjustments.max_threshold)
}

impl ModelTable {
    /// Adaptive threshold of the named model.
    pub fn adaptive_threshold(
        &self,
        name: &str,
        ctx: Option<&QualityContext>,
    ) -> Result<f64, EnsembleError> {
        let model = self.require(name)?;
        Ok(adaptive_threshold(model, &self.context, ctx))
    }
}

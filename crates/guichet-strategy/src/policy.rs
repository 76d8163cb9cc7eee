//! Shared confidence/ignorance policy.

use guichet_core::error::{GuichetError, Result};
use guichet_core::types::AnswerResult;

use crate::prompts::IGNORANCE_MESSAGE;

/// Decides when an answer is too weak to show. Applied by every strategy
/// after it has produced a candidate result.
#[derive(Debug, Clone, Copy)]
pub struct ConfidencePolicy {
    threshold: f32,
}

impl ConfidencePolicy {
    /// `threshold` must lie in [0, 1].
    pub fn new(threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(GuichetError::InvalidArgument(format!(
                "confidence threshold must be in [0, 1], got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Replace the answer text with the fixed ignorance message and drop the
    /// sources when confidence is under the threshold. The computed
    /// confidence itself is kept.
    pub fn apply(&self, mut result: AnswerResult) -> AnswerResult {
        if result.confidence < self.threshold {
            result.text = IGNORANCE_MESSAGE.to_string();
            result.sources.clear();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guichet_core::types::StrategyKind;

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(ConfidencePolicy::new(-0.1).is_err());
        assert!(ConfidencePolicy::new(1.1).is_err());
        assert!(ConfidencePolicy::new(0.5).is_ok());
    }

    #[test]
    fn overrides_below_threshold_but_keeps_confidence() {
        let policy = ConfidencePolicy::new(0.5).unwrap();
        let candidate = AnswerResult::new(StrategyKind::Rag, "Réponse douteuse", 0.42)
            .with_sources(vec!["EC001".into()]);
        let out = policy.apply(candidate);
        assert_eq!(out.text, IGNORANCE_MESSAGE);
        assert!(out.sources.is_empty());
        assert_eq!(out.confidence, 0.42);
    }

    #[test]
    fn keeps_answers_at_or_above_threshold() {
        let policy = ConfidencePolicy::new(0.5).unwrap();
        let at = policy.apply(AnswerResult::new(StrategyKind::Rag, "Réponse", 0.5));
        assert_eq!(at.text, "Réponse");
        let above = policy
            .apply(AnswerResult::new(StrategyKind::Rag, "Réponse", 0.9).with_sources(vec!["A".into()]));
        assert_eq!(above.sources, vec!["A".to_string()]);
    }
}

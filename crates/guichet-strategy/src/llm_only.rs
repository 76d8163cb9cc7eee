//! Strategy A — direct generative answering, no retrieval.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use guichet_core::error::Result;
use guichet_core::traits::{AnswerBackend, GenerateOptions, Strategy};
use guichet_core::types::{AnswerResult, StrategyKind};

use crate::policy::ConfidencePolicy;
use crate::prompts;
use crate::retry::RetryPolicy;
use crate::{elapsed_ms, failure_result, validate_question};

const GEN_OPTS: GenerateOptions = GenerateOptions { max_tokens: 500, temperature: 0.5 };

/// Heuristic confidence when the backend reports none.
const DEFAULT_CONFIDENCE: f32 = 0.7;
/// Downgraded heuristic when the reply itself admits ignorance.
const UNCERTAIN_CONFIDENCE: f32 = 0.5;

/// Answers straight from the model's own knowledge. No index, no sources.
pub struct LlmOnly {
    backend: Arc<dyn AnswerBackend>,
    policy: ConfidencePolicy,
    retry: RetryPolicy,
}

impl LlmOnly {
    pub fn new(backend: Arc<dyn AnswerBackend>, policy: ConfidencePolicy, retry: RetryPolicy) -> Self {
        Self { backend, policy, retry }
    }

    async fn produce(&self, question: &str) -> Result<AnswerResult> {
        let generation = self
            .retry
            .run("generation", || {
                self.backend
                    .generate(question, Some(prompts::LLM_ONLY_SYSTEM), &GEN_OPTS)
            })
            .await?;

        let confidence = match generation.confidence {
            Some(c) => c,
            None if prompts::admits_ignorance(&generation.text) => UNCERTAIN_CONFIDENCE,
            None => DEFAULT_CONFIDENCE,
        };
        debug!(confidence, "llm_only candidate produced");

        Ok(AnswerResult::new(StrategyKind::LlmOnly, generation.text, confidence))
    }
}

#[async_trait]
impl Strategy for LlmOnly {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LlmOnly
    }

    async fn answer(&self, question: &str) -> Result<AnswerResult> {
        let question = validate_question(question)?;
        let started = Instant::now();
        let result = match self.produce(question).await {
            Ok(candidate) => self.policy.apply(candidate),
            Err(e) => failure_result(StrategyKind::LlmOnly, &e),
        };
        Ok(result.with_latency(elapsed_ms(started)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guichet_core::error::{ErrorKind, GuichetError};
    use guichet_core::traits::{Extraction, Generation};

    struct CannedBackend {
        text: String,
        confidence: Option<f32>,
        fail: bool,
    }

    #[async_trait]
    impl AnswerBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _instructions: Option<&str>,
            _opts: &GenerateOptions,
        ) -> Result<Generation> {
            if self.fail {
                return Err(GuichetError::GenerationFailure("503".into()));
            }
            Ok(Generation { text: self.text.clone(), confidence: self.confidence })
        }

        async fn extract(&self, _question: &str, _context: &str) -> Result<Extraction> {
            Err(GuichetError::GenerationFailure("not an extractive backend".into()))
        }
    }

    fn strategy(text: &str, confidence: Option<f32>, fail: bool) -> LlmOnly {
        LlmOnly::new(
            Arc::new(CannedBackend { text: text.into(), confidence, fail }),
            ConfidencePolicy::new(0.5).unwrap(),
            RetryPolicy::new(1, 1),
        )
    }

    #[tokio::test]
    async fn confident_reply_uses_heuristic_constant() {
        let s = strategy("Rendez-vous en mairie avec une pièce d'identité.", None, false);
        let r = s.answer("Comment obtenir un acte de naissance ?").await.unwrap();
        assert_eq!(r.confidence, 0.7);
        assert_eq!(r.text, "Rendez-vous en mairie avec une pièce d'identité.");
        assert!(r.sources.is_empty());
        assert!(r.error.is_none());
        assert!(r.latency_ms >= 0.0);
    }

    #[tokio::test]
    async fn uncertain_reply_is_downgraded() {
        let s = strategy("Je ne sais pas, cette question dépasse mon périmètre.", None, false);
        let r = s.answer("Quelle est la capitale de l'Australie ?").await.unwrap();
        // 0.5 is not strictly below the 0.5 threshold — text is kept as-is
        assert_eq!(r.confidence, 0.5);
        assert!(r.text.contains("Je ne sais pas"));
    }

    #[tokio::test]
    async fn backend_confidence_wins_and_low_values_trigger_override() {
        let s = strategy("Réponse hasardeuse.", Some(0.3), false);
        let r = s.answer("Comment fonctionne la 5G ?").await.unwrap();
        assert_eq!(r.confidence, 0.3);
        assert_eq!(r.text, prompts::IGNORANCE_MESSAGE);
        assert!(r.sources.is_empty());
    }

    #[tokio::test]
    async fn backend_failure_becomes_terminal_result() {
        let s = strategy("", None, true);
        let r = s.answer("Comment obtenir un acte de naissance ?").await.unwrap();
        assert_eq!(r.error, Some(ErrorKind::BackendUnavailable));
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.text, prompts::BACKEND_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let s = strategy("peu importe", None, false);
        assert!(matches!(
            s.answer("   ").await,
            Err(GuichetError::InvalidArgument(_))
        ));
    }
}

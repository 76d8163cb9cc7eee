//! Inference-API backend.
//!
//! One client covers the three capabilities the engine needs:
//! - **generate** — OpenAI-compatible chat completions (any provider)
//! - **embed** — feature-extraction pipeline (Hugging Face)
//! - **extract** — question-answering pipeline (Hugging Face)
//!
//! Providers differ only by endpoint URL, auth style and API key; HTTP 429
//! maps to `RateLimited` so the strategy layer can back off.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use guichet_core::config::GuichetConfig;
use guichet_core::error::{GuichetError, Result};
use guichet_core::traits::{AnswerBackend, Extraction, GenerateOptions, Generation, TextEmbedder};

use crate::registry::{AuthStyle, BackendPreset};

/// Feature-extraction embedder over the pipeline API.
pub struct PipelineEmbedder {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl PipelineEmbedder {
    pub fn new(preset: &BackendPreset, api_key: String, config: &GuichetConfig) -> Result<Self> {
        if preset.pipeline_base_url.is_empty() {
            return Err(GuichetError::Config(format!(
                "provider '{}' exposes no feature-extraction pipeline",
                preset.name
            )));
        }
        Ok(Self {
            api_key,
            base_url: preset.pipeline_base_url.to_string(),
            model: config.backend.embedding_model.clone(),
            client: build_client(config.backend.timeout_secs)?,
        })
    }
}

#[async_trait]
impl TextEmbedder for PipelineEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/{}", self.base_url, self.model);
        let req = apply_bearer(self.client.post(&url), &self.api_key)
            .json(&json!({ "inputs": text }));

        let resp = req
            .send()
            .await
            .map_err(|e| GuichetError::EmbeddingFailure(format!("{url}: {e}")))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(GuichetError::RateLimited("embedding API returned 429".into()));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GuichetError::EmbeddingFailure(format!(
                "embedding API error {status}: {text}"
            )));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| GuichetError::EmbeddingFailure(e.to_string()))?;
        let vector = parse_vector(&value).ok_or_else(|| {
            GuichetError::EmbeddingFailure("embedding response is not a vector".into())
        })?;
        debug!(model = %self.model, dim = vector.len(), "text embedded");
        Ok(vector)
    }
}

/// Chat-completions + QA-pipeline implementation of [`AnswerBackend`].
pub struct InferenceBackend {
    name: String,
    api_key: String,
    chat_base_url: String,
    /// Empty when the provider has no QA pipeline — `extract` then fails.
    pipeline_base_url: String,
    generation_model: String,
    qa_model: String,
    client: reqwest::Client,
}

impl InferenceBackend {
    pub fn new(preset: &BackendPreset, api_key: String, config: &GuichetConfig) -> Result<Self> {
        let chat_base_url = if config.backend.api_base_url.is_empty() {
            preset.chat_base_url.to_string()
        } else {
            config.backend.api_base_url.trim_end_matches('/').to_string()
        };
        Ok(Self {
            name: preset.name.to_string(),
            api_key,
            chat_base_url,
            pipeline_base_url: preset.pipeline_base_url.to_string(),
            generation_model: config.backend.generation_model.clone(),
            qa_model: config.backend.qa_model.clone(),
            client: build_client(config.backend.timeout_secs)?,
        })
    }

    /// Custom OpenAI-compatible endpoint ("custom:https://my-server/v1").
    /// No pipeline API, so only generation works.
    pub fn custom(endpoint: &str, api_key: String, config: &GuichetConfig) -> Result<Self> {
        let base = endpoint
            .strip_prefix("custom:")
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            name: "custom".to_string(),
            api_key,
            chat_base_url: base,
            pipeline_base_url: String::new(),
            generation_model: config.backend.generation_model.clone(),
            qa_model: config.backend.qa_model.clone(),
            client: build_client(config.backend.timeout_secs)?,
        })
    }
}

#[async_trait]
impl AnswerBackend for InferenceBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        instructions: Option<&str>,
        opts: &GenerateOptions,
    ) -> Result<Generation> {
        let mut messages = Vec::new();
        if let Some(system) = instructions {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let body = json!({
            "model": self.generation_model,
            "temperature": opts.temperature,
            "max_tokens": opts.max_tokens,
            "messages": messages,
        });

        let url = format!("{}/chat/completions", self.chat_base_url);
        let req = apply_bearer(self.client.post(&url), &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body);

        let resp = req.send().await.map_err(|e| {
            GuichetError::GenerationFailure(format!("{} connection failed ({url}): {e}", self.name))
        })?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(GuichetError::RateLimited(format!("{} returned 429", self.name)));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GuichetError::GenerationFailure(format!(
                "{} API error {status}: {text}",
                self.name
            )));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| GuichetError::GenerationFailure(e.to_string()))?;
        let content = value["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| GuichetError::GenerationFailure("no choices in response".into()))?;

        Ok(Generation {
            text: content.trim().to_string(),
            // chat-completions APIs report no answer confidence
            confidence: None,
        })
    }

    async fn extract(&self, question: &str, context: &str) -> Result<Extraction> {
        if self.pipeline_base_url.is_empty() {
            return Err(GuichetError::Config(format!(
                "provider '{}' exposes no question-answering pipeline",
                self.name
            )));
        }

        let url = format!("{}/{}", self.pipeline_base_url, self.qa_model);
        let body = json!({ "inputs": { "question": question, "context": context } });
        let req = apply_bearer(self.client.post(&url), &self.api_key).json(&body);

        let resp = req.send().await.map_err(|e| {
            GuichetError::GenerationFailure(format!("{} connection failed ({url}): {e}", self.name))
        })?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(GuichetError::RateLimited(format!("{} returned 429", self.name)));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GuichetError::GenerationFailure(format!(
                "{} QA API error {status}: {text}",
                self.name
            )));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| GuichetError::GenerationFailure(e.to_string()))?;
        parse_extraction(&value).ok_or_else(|| {
            GuichetError::GenerationFailure("QA response has no answer/score fields".into())
        })
    }
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GuichetError::Config(format!("failed to build HTTP client: {e}")))
}

fn apply_bearer(req: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    if api_key.is_empty() {
        req
    } else {
        req.header("Authorization", format!("Bearer {api_key}"))
    }
}

/// Accept both pipeline output shapes: a flat vector, or a batch of one.
fn parse_vector(value: &Value) -> Option<Vec<f32>> {
    let arr = value.as_array()?;
    let numbers = if arr.first()?.is_array() {
        arr.first()?.as_array()?
    } else {
        arr
    };
    numbers
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

fn parse_extraction(value: &Value) -> Option<Extraction> {
    // single answer object, or a ranked list of candidates
    let obj = if value.is_array() { value.get(0)? } else { value };
    Some(Extraction {
        span: obj["answer"].as_str()?.to_string(),
        score: obj["score"].as_f64()? as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_vector() {
        let v = json!([0.1, -0.2, 0.3]);
        assert_eq!(parse_vector(&v).unwrap(), vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn parses_batched_vector() {
        let v = json!([[1.0, 2.0]]);
        assert_eq!(parse_vector(&v).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn rejects_non_vectors() {
        assert!(parse_vector(&json!({"error": "loading"})).is_none());
        assert!(parse_vector(&json!([])).is_none());
        assert!(parse_vector(&json!(["a", "b"])).is_none());
    }

    #[test]
    fn parses_qa_object_and_list() {
        let single = json!({"answer": "en mairie", "score": 0.92, "start": 3, "end": 12});
        let e = parse_extraction(&single).unwrap();
        assert_eq!(e.span, "en mairie");
        assert!((e.score - 0.92).abs() < 1e-6);

        let ranked = json!([{"answer": "à la mairie", "score": 0.7}, {"answer": "ailleurs", "score": 0.1}]);
        assert_eq!(parse_extraction(&ranked).unwrap().span, "à la mairie");
    }

    #[test]
    fn rejects_malformed_qa_payload() {
        assert!(parse_extraction(&json!({"réponse": "x"})).is_none());
    }
}

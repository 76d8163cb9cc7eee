//! Guichet configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuichetConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub bench: BenchConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Default for GuichetConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            retrieval: RetrievalConfig::default(),
            answer: AnswerConfig::default(),
            bench: BenchConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl GuichetConfig {
    /// Load config from the default path (~/.guichet/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::GuichetError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::GuichetError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::GuichetError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".guichet")
            .join("config.toml")
    }
}

/// Inference backend configuration (embedder + generative + extractive).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Registered provider name ("huggingface", "openai", "ollama").
    #[serde(default = "default_provider")]
    pub provider: String,
    /// API key; falls back to the provider's env var when empty.
    #[serde(default)]
    pub api_key: String,
    /// Override for the provider's base URL; empty uses the registry preset.
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_qa_model")]
    pub qa_model: String,
    /// Per-request timeout for every outbound call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String { "huggingface".into() }
fn default_generation_model() -> String { "mistralai/Mistral-7B-Instruct-v0.2".into() }
fn default_embedding_model() -> String { "sentence-transformers/all-MiniLM-L6-v2".into() }
fn default_qa_model() -> String { "deepset/roberta-base-squad2".into() }
fn default_timeout_secs() -> u64 { 60 }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            api_base_url: String::new(),
            generation_model: default_generation_model(),
            embedding_model: default_embedding_model(),
            qa_model: default_qa_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of FAQ entries retrieved as context.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize { 3 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: default_top_k() }
    }
}

/// Answering policy configuration, shared by all strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Strategy bound at startup for `serve`/`ask` (llm_only | rag | extractive_qa).
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Below this confidence the ignorance message replaces the answer.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Retries after the first failed attempt of a backend call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_strategy() -> String { "rag".into() }
fn default_confidence_threshold() -> f32 { 0.5 }
fn default_max_retries() -> u32 { 2 }
fn default_retry_base_delay_ms() -> u64 { 500 }

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            confidence_threshold: default_confidence_threshold(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

/// Benchmark harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Max (item, strategy) pairs in flight at once. 1 = sequential.
    #[serde(default = "default_worker_limit")]
    pub worker_limit: usize,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub complexity: ComplexityConfig,
}

fn default_worker_limit() -> usize { 4 }

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            worker_limit: default_worker_limit(),
            weights: WeightsConfig::default(),
            complexity: ComplexityConfig::default(),
        }
    }
}

/// Criterion weights for the evaluation ranking. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_w_accuracy")]
    pub accuracy: f64,
    #[serde(default = "default_w_relevance")]
    pub relevance: f64,
    #[serde(default = "default_w_hallucination")]
    pub hallucination: f64,
    #[serde(default = "default_w_latency")]
    pub latency: f64,
    #[serde(default = "default_w_complexity")]
    pub complexity: f64,
}

fn default_w_accuracy() -> f64 { 0.30 }
fn default_w_relevance() -> f64 { 0.20 }
fn default_w_hallucination() -> f64 { 0.20 }
fn default_w_latency() -> f64 { 0.15 }
fn default_w_complexity() -> f64 { 0.15 }

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            accuracy: default_w_accuracy(),
            relevance: default_w_relevance(),
            hallucination: default_w_hallucination(),
            latency: default_w_latency(),
            complexity: default_w_complexity(),
        }
    }
}

/// Fixed operational-complexity score per strategy (higher = simpler to run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityConfig {
    #[serde(default = "default_cx_llm_only")]
    pub llm_only: f64,
    #[serde(default = "default_cx_rag")]
    pub rag: f64,
    #[serde(default = "default_cx_extractive_qa")]
    pub extractive_qa: f64,
}

fn default_cx_llm_only() -> f64 { 0.9 }
fn default_cx_rag() -> f64 { 0.7 }
fn default_cx_extractive_qa() -> f64 { 0.6 }

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            llm_only: default_cx_llm_only(),
            rag: default_cx_rag(),
            extractive_qa: default_cx_extractive_qa(),
        }
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8000 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

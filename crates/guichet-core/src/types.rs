//! Core domain types shared across the workspace.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// One FAQ entry of the knowledge base. Immutable after load; its embedding
/// is computed at index build time and owned by the index, not the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    #[serde(default)]
    pub theme: String,
    pub question: String,
    pub answer: String,
}

impl KnowledgeEntry {
    /// The text the index embeds for this entry: question and answer
    /// concatenated, so both phrasings contribute to similarity.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.question, self.answer)
    }
}

/// One nearest-neighbor match. Borrows the entry from the index; hits are
/// consumed within the query call, never stored.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalHit<'a> {
    pub entry: &'a KnowledgeEntry,
    /// Clamped cosine similarity in [0, 1].
    pub score: f32,
}

/// The three interchangeable answering strategies. Selected at construction
/// time; benchmark records and reports carry the snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Direct generative call, no retrieval.
    LlmOnly,
    /// Retrieval-augmented generation over the FAQ index.
    Rag,
    /// Span extraction from retrieved FAQ answers.
    ExtractiveQa,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] =
        [StrategyKind::LlmOnly, StrategyKind::Rag, StrategyKind::ExtractiveQa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LlmOnly => "llm_only",
            Self::Rag => "rag",
            Self::ExtractiveQa => "extractive_qa",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "llm_only" | "llm" => Ok(Self::LlmOnly),
            "rag" => Ok(Self::Rag),
            "extractive_qa" | "qa" => Ok(Self::ExtractiveQa),
            other => Err(format!("unknown strategy '{other}' (expected llm_only, rag or extractive_qa)")),
        }
    }
}

/// The answer produced for one question. Built fresh per query and never
/// mutated afterwards; `confidence` is clamped to [0, 1] at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub text: String,
    pub confidence: f32,
    pub strategy: StrategyKind,
    /// Ids of the knowledge entries the answer was grounded on, best first.
    #[serde(default)]
    pub sources: Vec<String>,
    pub latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl AnswerResult {
    pub fn new(strategy: StrategyKind, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: clamp_unit(confidence),
            strategy,
            sources: Vec::new(),
            latency_ms: 0.0,
            error: None,
        }
    }

    /// Terminal failure result: sentinel confidence 0, error tag set.
    pub fn failed(strategy: StrategyKind, kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: 0.0,
            strategy,
            sources: Vec::new(),
            latency_ms: 0.0,
            error: Some(kind),
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

/// Clamp a confidence-like signal into [0, 1]. NaN collapses to 0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Category of a golden-set question, driving how accuracy is judged.
/// French aliases match the source datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    DirectMatch,
    Reformulation,
    #[serde(alias = "complexe")]
    Complex,
    #[serde(alias = "hors_sujet")]
    OffTopic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[serde(alias = "facile")]
    Easy,
    #[default]
    #[serde(alias = "moyen", alias = "moyenne")]
    Medium,
    #[serde(alias = "difficile")]
    Hard,
}

/// One labeled question of the golden set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    /// Entry the question paraphrases, when one exists (absent for off_topic).
    #[serde(default)]
    pub reference_entry_id: Option<String>,
    /// Keywords the answer must all contain to count as accurate.
    #[serde(default)]
    pub expected_keywords: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

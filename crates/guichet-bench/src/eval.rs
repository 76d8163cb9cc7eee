//! Evaluation engine — turns raw benchmark records into ranked,
//! multi-criteria strategy scores.
//!
//! Five criteria per strategy: keyword accuracy, human-assessed relevance,
//! absence of hallucination, latency band, and a fixed operational
//! complexity score. The weighted total decides the ranking; ties break on
//! strategy name so reruns always agree.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use guichet_core::config::{BenchConfig, ComplexityConfig, WeightsConfig};
use guichet_core::error::{GuichetError, Result};
use guichet_core::types::{QuestionType, ReferenceItem, StrategyKind};

use crate::runner::RawBenchmarkRecord;

/// The five scored criteria, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Accuracy,
    Relevance,
    Hallucination,
    Latency,
    Complexity,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Accuracy,
        Criterion::Relevance,
        Criterion::Hallucination,
        Criterion::Latency,
        Criterion::Complexity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::Relevance => "relevance",
            Self::Hallucination => "hallucination",
            Self::Latency => "latency",
            Self::Complexity => "complexity",
        }
    }

    /// User-facing label for the report, in the service's language.
    pub fn label_fr(&self) -> &'static str {
        match self {
            Self::Accuracy => "exactitude",
            Self::Relevance => "pertinence",
            Self::Hallucination => "absence d'hallucination",
            Self::Latency => "latence",
            Self::Complexity => "simplicité opérationnelle",
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One criterion's value for one strategy, always in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: Criterion,
    pub value: f64,
}

/// Scored outcome of one strategy over the whole golden set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyScore {
    pub strategy: StrategyKind,
    /// One entry per criterion, in [`Criterion::ALL`] order.
    pub criteria: Vec<CriterionScore>,
    pub weighted_total: f64,
}

impl StrategyScore {
    pub fn value(&self, criterion: Criterion) -> f64 {
        self.criteria
            .iter()
            .find(|c| c.criterion == criterion)
            .map(|c| c.value)
            .unwrap_or(0.0)
    }
}

/// Validated criterion weights. Each weight is non-negative and the five
/// sum to 1.0, so the weighted total stays in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub accuracy: f64,
    pub relevance: f64,
    pub hallucination: f64,
    pub latency: f64,
    pub complexity: f64,
}

impl Weights {
    pub fn new(
        accuracy: f64,
        relevance: f64,
        hallucination: f64,
        latency: f64,
        complexity: f64,
    ) -> Result<Self> {
        let weights = Self { accuracy, relevance, hallucination, latency, complexity };
        for (name, value) in [
            ("accuracy", accuracy),
            ("relevance", relevance),
            ("hallucination", hallucination),
            ("latency", latency),
            ("complexity", complexity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(GuichetError::Config(format!(
                    "bench.weights.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        let sum = accuracy + relevance + hallucination + latency + complexity;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(GuichetError::Config(format!(
                "bench.weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(weights)
    }

    pub fn from_config(config: &WeightsConfig) -> Result<Self> {
        Self::new(
            config.accuracy,
            config.relevance,
            config.hallucination,
            config.latency,
            config.complexity,
        )
    }
}

/// One human (or LLM-judge) verdict for a (question, strategy) pair.
/// Produced outside the harness and loaded alongside the golden set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Answer relevance on a 0..1 scale.
    pub relevance: f64,
    /// Whether the answer asserted facts absent from the FAQ.
    pub hallucinated: bool,
}

/// Assessments keyed by (reference item id, strategy). Pairs with no
/// verdict score zero relevance and count as not hallucinated.
#[derive(Debug, Clone, Default)]
pub struct AssessmentSet {
    inner: HashMap<(String, StrategyKind), Assessment>,
}

impl AssessmentSet {
    pub fn insert(
        &mut self,
        item_id: impl Into<String>,
        strategy: StrategyKind,
        assessment: Assessment,
    ) {
        self.inner.insert((item_id.into(), strategy), assessment);
    }

    pub fn get(&self, item_id: &str, strategy: StrategyKind) -> Option<&Assessment> {
        self.inner.get(&(item_id.to_owned(), strategy))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Scores a benchmark run.
pub struct EvaluationEngine {
    weights: Weights,
    complexity: ComplexityConfig,
    refusal_patterns: Vec<Regex>,
}

/// Matched against normalized answer text to detect an explicit refusal.
/// Covers the two fixed fallback messages plus the usual free-text French
/// ways of declining a question.
const REFUSAL_PATTERNS: [&str; 5] = [
    r"je n ai pas (trouve|d information|cette information)",
    r"je ne (sais|peux) pas",
    r"hors (de mon|du) (domaine|perimetre|champ)",
    r"pas d information (pertinente|disponible)",
    r"ne releve pas de",
];

impl EvaluationEngine {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        let weights = Weights::from_config(&config.weights)?;
        let refusal_patterns = REFUSAL_PATTERNS
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| GuichetError::Internal(format!("refusal pattern '{p}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { weights, complexity: config.complexity.clone(), refusal_patterns })
    }

    /// Score every strategy present in `records` and rank them, best first.
    /// Ties on the weighted total order by strategy name.
    pub fn score(
        &self,
        records: &[RawBenchmarkRecord],
        items: &[ReferenceItem],
        assessments: &AssessmentSet,
    ) -> Result<Vec<StrategyScore>> {
        let by_id: HashMap<&str, &ReferenceItem> =
            items.iter().map(|i| (i.id.as_str(), i)).collect();

        let mut order: Vec<StrategyKind> = Vec::new();
        let mut groups: HashMap<StrategyKind, Vec<&RawBenchmarkRecord>> = HashMap::new();
        for record in records {
            if !by_id.contains_key(record.reference_item_id.as_str()) {
                return Err(GuichetError::InvalidArgument(format!(
                    "record references unknown golden-set item '{}'",
                    record.reference_item_id
                )));
            }
            if !groups.contains_key(&record.strategy) {
                order.push(record.strategy);
            }
            groups.entry(record.strategy).or_default().push(record);
        }

        let mut scores: Vec<StrategyScore> = order
            .into_iter()
            .map(|kind| self.score_group(kind, &groups[&kind], &by_id, assessments))
            .collect();

        scores.sort_by(|a, b| {
            b.weighted_total
                .partial_cmp(&a.weighted_total)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.strategy.as_str().cmp(b.strategy.as_str()))
        });
        Ok(scores)
    }

    fn score_group(
        &self,
        kind: StrategyKind,
        group: &[&RawBenchmarkRecord],
        by_id: &HashMap<&str, &ReferenceItem>,
        assessments: &AssessmentSet,
    ) -> StrategyScore {
        let n = group.len() as f64;

        let accurate = group
            .iter()
            .filter(|r| self.is_accurate(r, by_id[r.reference_item_id.as_str()]))
            .count();
        let accuracy = accurate as f64 / n;

        let relevance = group
            .iter()
            .map(|r| {
                assessments
                    .get(&r.reference_item_id, r.strategy)
                    .map(|a| a.relevance.clamp(0.0, 1.0))
                    .unwrap_or(0.0)
            })
            .sum::<f64>()
            / n;

        // Extraction copies spans verbatim out of the FAQ, so it cannot
        // invent facts whatever the judge flagged.
        let hallucination = if kind == StrategyKind::ExtractiveQa {
            1.0
        } else {
            let flagged = group
                .iter()
                .filter(|r| {
                    assessments
                        .get(&r.reference_item_id, r.strategy)
                        .map(|a| a.hallucinated)
                        .unwrap_or(false)
                })
                .count();
            1.0 - flagged as f64 / n
        };

        let mean_latency = group.iter().map(|r| r.answer.latency_ms).sum::<f64>() / n;
        let latency = latency_score(mean_latency);

        let complexity = match kind {
            StrategyKind::LlmOnly => self.complexity.llm_only,
            StrategyKind::Rag => self.complexity.rag,
            StrategyKind::ExtractiveQa => self.complexity.extractive_qa,
        }
        .clamp(0.0, 1.0);

        let weighted_total = self.weights.accuracy * accuracy
            + self.weights.relevance * relevance
            + self.weights.hallucination * hallucination
            + self.weights.latency * latency
            + self.weights.complexity * complexity;

        debug!(
            strategy = %kind,
            accuracy,
            relevance,
            hallucination,
            latency,
            complexity,
            weighted_total,
            "strategy scored"
        );

        let values = [accuracy, relevance, hallucination, latency, complexity];
        StrategyScore {
            strategy: kind,
            criteria: Criterion::ALL
                .into_iter()
                .zip(values)
                .map(|(criterion, value)| CriterionScore { criterion, value })
                .collect(),
            weighted_total,
        }
    }

    /// Off-topic questions are accurate when the answer declines; every
    /// other question type must contain all expected keywords. Keyword and
    /// answer are both normalized, so accents and case never break a match.
    fn is_accurate(&self, record: &RawBenchmarkRecord, item: &ReferenceItem) -> bool {
        let text = normalize(&record.answer.text);
        match item.question_type {
            QuestionType::OffTopic => self.is_refusal(&text),
            _ => item
                .expected_keywords
                .iter()
                .all(|kw| text.contains(normalize(kw).as_str())),
        }
    }

    fn is_refusal(&self, normalized_text: &str) -> bool {
        self.refusal_patterns.iter().any(|p| p.is_match(normalized_text))
    }
}

/// Piecewise latency band over the strategy's mean answer time.
fn latency_score(mean_ms: f64) -> f64 {
    if mean_ms < 2000.0 {
        1.0
    } else if mean_ms < 3000.0 {
        0.85
    } else if mean_ms < 4000.0 {
        0.70
    } else {
        0.50
    }
}

/// Lowercase, strip French diacritics, collapse punctuation to single
/// spaces. Keyword matching and refusal detection both run on this form.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        match c {
            'à' | 'â' | 'ä' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'î' | 'ï' => out.push('i'),
            'ô' | 'ö' => out.push('o'),
            'ù' | 'û' | 'ü' => out.push('u'),
            'ç' => out.push('c'),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            c if c.is_alphanumeric() => out.push(c),
            _ => out.push(' '),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Benchmark report — operational aggregates, the ranking, and a
//! recommendation, printable and serializable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use guichet_core::error::{GuichetError, Result};
use guichet_core::types::StrategyKind;

use crate::eval::StrategyScore;
use crate::runner::RawBenchmarkRecord;

/// A criterion at or above this value is a cited strength.
const STRENGTH_FLOOR: f64 = 0.8;
/// A criterion below this value is a cited weakness.
const WEAKNESS_CEILING: f64 = 0.5;

/// Latency aggregate over one strategy's records, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl LatencyStats {
    fn from_records(records: &[&RawBenchmarkRecord]) -> Self {
        if records.is_empty() {
            return Self { mean_ms: 0.0, min_ms: 0.0, max_ms: 0.0 };
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for r in records {
            let l = r.answer.latency_ms;
            min = min.min(l);
            max = max.max(l);
            sum += l;
        }
        Self { mean_ms: sum / records.len() as f64, min_ms: min, max_ms: max }
    }
}

/// Operational counters for one strategy over the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: StrategyKind,
    pub records: usize,
    /// Records carrying an error tag (terminal backend failures included).
    pub errors: usize,
    pub error_rate: f64,
    pub latency: LatencyStats,
}

/// The winning strategy plus its notable criteria, in French for the
/// people the report is written for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub strategy: StrategyKind,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

impl Recommendation {
    fn from_score(score: &StrategyScore) -> Self {
        let strengths = score
            .criteria
            .iter()
            .filter(|c| c.value >= STRENGTH_FLOOR)
            .map(|c| c.criterion.label_fr().to_string())
            .collect();
        let weaknesses = score
            .criteria
            .iter()
            .filter(|c| c.value < WEAKNESS_CEILING)
            .map(|c| c.criterion.label_fr().to_string())
            .collect();
        Self { strategy: score.strategy, strengths, weaknesses }
    }
}

/// Everything one benchmark run produced. Serialized as-is to the output
/// file so a run can be re-scored or audited later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Golden-set size the run covered.
    pub items: usize,
    /// One summary per strategy, ranking order.
    pub strategies: Vec<StrategySummary>,
    /// Best first.
    pub ranking: Vec<StrategyScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    pub records: Vec<RawBenchmarkRecord>,
}

impl BenchmarkReport {
    pub fn new(
        records: Vec<RawBenchmarkRecord>,
        ranking: Vec<StrategyScore>,
        items: usize,
    ) -> Self {
        let strategies =
            ranking.iter().map(|score| summarize(score.strategy, &records)).collect();
        let recommendation = ranking.first().map(Recommendation::from_score);
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            items,
            strategies,
            ranking,
            recommendation,
            records,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GuichetError::Internal(format!("report serialization: {e}")))
    }

    /// Human-readable summary on stdout.
    pub fn print_summary(&self) {
        println!("\n========== RAPPORT DE BENCHMARK ==========\n");
        println!(
            "Run {} — {}",
            self.run_id,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!(
            "{} questions du jeu de référence, {} stratégies, {} réponses",
            self.items,
            self.ranking.len(),
            self.records.len()
        );

        println!("\n---------- Classement ----------\n");
        for (rank, score) in self.ranking.iter().enumerate() {
            println!(
                "{}. {} — score pondéré {:.3}",
                rank + 1,
                score.strategy,
                score.weighted_total
            );
            for c in &score.criteria {
                println!("     {:<26} {:.2}", c.criterion.label_fr(), c.value);
            }
        }

        println!("\n---------- Latence et erreurs ----------\n");
        for s in &self.strategies {
            println!(
                "{:<14} moyenne {:>6.0} ms  (min {:.0}, max {:.0})  erreurs {}/{} ({:.0}%)",
                s.strategy.as_str(),
                s.latency.mean_ms,
                s.latency.min_ms,
                s.latency.max_ms,
                s.errors,
                s.records,
                s.error_rate * 100.0
            );
        }

        if let Some(rec) = &self.recommendation {
            println!("\n---------- Recommandation ----------\n");
            println!("Stratégie conseillée : {}", rec.strategy);
            if !rec.strengths.is_empty() {
                println!("  Points forts : {}", rec.strengths.join(", "));
            }
            if !rec.weaknesses.is_empty() {
                println!("  Points faibles : {}", rec.weaknesses.join(", "));
            }
        }
        println!("\n==========================================\n");
    }
}

fn summarize(kind: StrategyKind, records: &[RawBenchmarkRecord]) -> StrategySummary {
    let group: Vec<&RawBenchmarkRecord> =
        records.iter().filter(|r| r.strategy == kind).collect();
    let errors = group.iter().filter(|r| r.answer.error.is_some()).count();
    let error_rate = if group.is_empty() { 0.0 } else { errors as f64 / group.len() as f64 };
    StrategySummary {
        strategy: kind,
        records: group.len(),
        errors,
        error_rate,
        latency: LatencyStats::from_records(&group),
    }
}

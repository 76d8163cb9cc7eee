//! # Guichet Bench
//!
//! Benchmark harness: runs every answering strategy over the golden set of
//! labeled questions, scores the outcome on five weighted criteria, and
//! renders a ranked report.
//!
//! ## Design
//! - **Collect, then judge** — the runner only records; every judgment
//!   lives in the evaluation engine, so a run can be re-scored with other
//!   weights without touching a backend.
//! - **Deterministic output** — records keep input order whatever the
//!   concurrency, and ranking ties break on strategy name.
//! - **Failures are rows** — a pair that fails still produces a record and
//!   is scored like any other answer.

pub mod eval;
pub mod report;
pub mod runner;

pub use eval::{
    Assessment, AssessmentSet, Criterion, CriterionScore, EvaluationEngine, StrategyScore,
    Weights,
};
pub use report::{BenchmarkReport, LatencyStats, Recommendation, StrategySummary};
pub use runner::{BenchmarkRunner, RawBenchmarkRecord};

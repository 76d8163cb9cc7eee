//! Benchmark runner — executes the full (reference item × strategy) product.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use guichet_core::error::ErrorKind;
use guichet_core::traits::Strategy;
use guichet_core::types::{AnswerResult, ReferenceItem, StrategyKind};
use guichet_strategy::prompts::BACKEND_FAILURE_MESSAGE;

/// One benchmarked pair. The full Cartesian product of one run, failures
/// included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBenchmarkRecord {
    pub reference_item_id: String,
    pub strategy: StrategyKind,
    pub answer: AnswerResult,
}

/// Drives every strategy over every reference item.
///
/// Pairs are independent — the only shared state is the read-only index
/// behind the strategies — so up to `worker_limit` of them run concurrently
/// within a strategy pass. Output stays grouped by strategy, then by input
/// item order, whatever the completion order was.
pub struct BenchmarkRunner {
    worker_limit: usize,
    cancel: Arc<AtomicBool>,
}

impl BenchmarkRunner {
    /// `worker_limit` is clamped to at least 1 (sequential).
    pub fn new(worker_limit: usize) -> Self {
        Self {
            worker_limit: worker_limit.max(1),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for aborting the run between pairs. In-flight calls finish or
    /// hit their own timeout; pairs not yet started produce no record.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run the full product and collect one record per attempted pair.
    pub async fn run(
        &self,
        items: &[ReferenceItem],
        strategies: &[Arc<dyn Strategy>],
    ) -> Vec<RawBenchmarkRecord> {
        let mut records = Vec::with_capacity(items.len() * strategies.len());
        let started = Instant::now();

        for strategy in strategies {
            if self.cancel.load(Ordering::SeqCst) {
                info!(strategy = %strategy.kind(), "benchmark cancelled, skipping remaining passes");
                break;
            }
            let kind = strategy.kind();
            info!(strategy = %kind, items = items.len(), "benchmark pass started");
            let pass_started = Instant::now();

            let produced: Vec<Option<RawBenchmarkRecord>> =
                futures::stream::iter(items.iter().map(|item| {
                    let strategy = strategy.clone();
                    let cancel = self.cancel.clone();
                    async move {
                        if cancel.load(Ordering::SeqCst) {
                            return None;
                        }
                        Some(run_pair(item, strategy).await)
                    }
                }))
                .buffered(self.worker_limit)
                .collect()
                .await;

            let before = records.len();
            records.extend(produced.into_iter().flatten());
            info!(
                strategy = %kind,
                records = records.len() - before,
                elapsed_ms = pass_started.elapsed().as_millis() as u64,
                "benchmark pass finished"
            );
        }

        info!(
            total_records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "✅ benchmark run complete"
        );
        records
    }
}

/// One pair. An `Err` out of a strategy is a programmer error by contract,
/// so it is recorded as `Internal` rather than aborting the run.
async fn run_pair(item: &ReferenceItem, strategy: Arc<dyn Strategy>) -> RawBenchmarkRecord {
    let started = Instant::now();
    let answer = match strategy.answer(&item.question).await {
        Ok(result) => result,
        Err(e) => {
            warn!(
                item_id = %item.id,
                strategy = %strategy.kind(),
                error = %e,
                "pair failed outside the strategy's own fallback"
            );
            AnswerResult::failed(strategy.kind(), ErrorKind::Internal, BACKEND_FAILURE_MESSAGE)
                .with_latency(started.elapsed().as_secs_f64() * 1000.0)
        }
    };
    debug!(
        item_id = %item.id,
        strategy = %answer.strategy,
        confidence = answer.confidence,
        latency_ms = answer.latency_ms,
        "pair recorded"
    );
    RawBenchmarkRecord {
        reference_item_id: item.id.clone(),
        strategy: answer.strategy,
        answer,
    }
}

//! # Guichet — FAQ answering engine for a French collectivité
//!
//! Usage:
//!   guichet serve                          # start the HTTP gateway
//!   guichet ask "Comment obtenir un acte de naissance ?" --strategy rag
//!   guichet bench --golden data/golden_set.json --out benchmark_report.json

mod dataset;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use guichet_bench::{AssessmentSet, BenchmarkReport, BenchmarkRunner, EvaluationEngine};
use guichet_core::config::GuichetConfig;
use guichet_core::traits::{AnswerBackend, Strategy, TextEmbedder};
use guichet_core::types::StrategyKind;
use guichet_gateway::AppState;
use guichet_index::RetrievalIndex;
use guichet_strategy::{build_all, build_strategy};

#[derive(Parser)]
#[command(
    name = "guichet",
    version,
    about = "🏛️ Guichet — réponses automatiques aux questions des usagers"
)]
struct Cli {
    /// Path to the configuration file (defaults to ~/.guichet/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the FAQ knowledge base (JSON)
    #[arg(long, default_value = "data/faq_base.json")]
    faq: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway with the configured strategy
    Serve,

    /// Answer one question on the command line, JSON on stdout
    Ask {
        /// The question to answer
        question: String,

        /// Strategy override (llm_only | rag | extractive_qa)
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
    },

    /// Run every strategy over the golden set and rank them
    Bench {
        /// Path to the golden question set (JSON)
        #[arg(long, default_value = "data/golden_set.json")]
        golden: PathBuf,

        /// External relevance/hallucination verdicts (JSON, optional)
        #[arg(long)]
        assessments: Option<PathBuf>,

        /// Where to write the JSON report
        #[arg(long, default_value = "benchmark_report.json")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => GuichetConfig::load_from(path)?,
        None => GuichetConfig::load()?,
    };

    match cli.command {
        Commands::Serve => serve(&config, &cli.faq).await,
        Commands::Ask { question, strategy } => {
            ask(&config, &cli.faq, &question, strategy).await
        }
        Commands::Bench { golden, assessments, out } => {
            bench(&config, &cli.faq, &golden, assessments.as_deref(), &out).await
        }
    }
}

/// Load the FAQ and stand up the capability stack every command needs.
async fn build_capabilities(
    config: &GuichetConfig,
    faq_path: &Path,
) -> Result<(Arc<dyn TextEmbedder>, Arc<dyn AnswerBackend>, Arc<RetrievalIndex>)> {
    let entries = dataset::load_faq(faq_path)?;
    tracing::info!("📚 FAQ loaded: {} entries from {}", entries.len(), faq_path.display());

    let embedder = guichet_backends::create_embedder(config)?;
    let backend = guichet_backends::create_backend(config)?;
    let index = RetrievalIndex::build(entries, embedder.as_ref()).await?;
    Ok((embedder, backend, Arc::new(index)))
}

fn configured_strategy(config: &GuichetConfig) -> Result<StrategyKind> {
    config
        .answer
        .strategy
        .parse()
        .map_err(|e: String| anyhow::anyhow!("answer.strategy: {e}"))
}

async fn serve(config: &GuichetConfig, faq_path: &Path) -> Result<()> {
    let (embedder, backend, index) = build_capabilities(config, faq_path).await?;
    let kind = configured_strategy(config)?;
    let strategy = build_strategy(kind, embedder, index.clone(), backend, config)?;

    println!("🏛️ Guichet v{}", env!("CARGO_PKG_VERSION"));
    println!("   🌐 API : http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   📚 FAQ : {} entrées", index.len());
    println!("   🧭 Stratégie : {kind}");
    println!();

    guichet_gateway::start(&config.gateway, AppState { strategy, index }).await
}

async fn ask(
    config: &GuichetConfig,
    faq_path: &Path,
    question: &str,
    strategy: Option<StrategyKind>,
) -> Result<()> {
    let (embedder, backend, index) = build_capabilities(config, faq_path).await?;
    let kind = match strategy {
        Some(k) => k,
        None => configured_strategy(config)?,
    };
    let strategy = build_strategy(kind, embedder, index, backend, config)?;

    let result = strategy.answer(question).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn bench(
    config: &GuichetConfig,
    faq_path: &Path,
    golden_path: &Path,
    assessments_path: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let (embedder, backend, index) = build_capabilities(config, faq_path).await?;
    let items = dataset::load_golden(golden_path)?;
    for item in &items {
        if let Some(id) = &item.reference_entry_id {
            if !index.contains_id(id) {
                tracing::warn!(
                    "⚠️ golden item '{}' references unknown FAQ entry '{}'",
                    item.id,
                    id
                );
            }
        }
    }

    let assessments = match assessments_path {
        Some(path) => dataset::load_assessments(path)?,
        None => {
            tracing::info!("no assessments file — relevance will score 0");
            AssessmentSet::default()
        }
    };

    let strategies = build_all(embedder, index.clone(), backend, config)?;
    println!(
        "🏁 Benchmark : {} questions × {} stratégies",
        items.len(),
        strategies.len()
    );

    let runner = BenchmarkRunner::new(config.bench.worker_limit);
    let records = runner.run(&items, &strategies).await;

    let engine = EvaluationEngine::new(&config.bench)?;
    let ranking = engine.score(&records, &items, &assessments)?;

    let report = BenchmarkReport::new(records, ranking, items.len());
    report.print_summary();

    std::fs::write(out, report.to_json()?)
        .with_context(|| format!("writing report to {}", out.display()))?;
    println!("📝 Rapport JSON : {}", out.display());
    Ok(())
}

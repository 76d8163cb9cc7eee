//! # Guichet Index
//!
//! In-memory nearest-neighbor retrieval over the FAQ knowledge base.
//!
//! ## Design
//! - **Build once, read forever** — embeddings are computed once per entry at
//!   build time; the index is immutable afterwards, so concurrent `search`
//!   calls need no locking.
//! - **All-or-nothing build** — a partial index would silently skew every
//!   downstream confidence, so any embedding failure aborts the build.
//! - **Deterministic ordering** — results are strictly descending by score
//!   with ties broken by ascending entry id, which keeps benchmark runs
//!   reproducible.

use tracing::{debug, info};

use guichet_core::error::{GuichetError, Result};
use guichet_core::traits::TextEmbedder;
use guichet_core::types::{KnowledgeEntry, RetrievalHit};

/// Semantic index over the loaded knowledge entries.
pub struct RetrievalIndex {
    entries: Vec<IndexedEntry>,
    dimension: usize,
}

struct IndexedEntry {
    entry: KnowledgeEntry,
    embedding: Vec<f32>,
}

impl RetrievalIndex {
    /// Embed every entry (question + answer text) and build the index.
    ///
    /// Fails with `EmbeddingFailure` if any entry cannot be embedded or if
    /// the embedder returns inconsistent dimensions — a partial index is
    /// never produced.
    pub async fn build(
        entries: Vec<KnowledgeEntry>,
        embedder: &dyn TextEmbedder,
    ) -> Result<Self> {
        let mut indexed = Vec::with_capacity(entries.len());
        let mut dimension = 0usize;

        for entry in entries {
            let embedding = embedder.embed(&entry.embedding_text()).await?;
            if embedding.is_empty() {
                return Err(GuichetError::EmbeddingFailure(format!(
                    "empty embedding for entry '{}'",
                    entry.id
                )));
            }
            if dimension == 0 {
                dimension = embedding.len();
            } else if embedding.len() != dimension {
                return Err(GuichetError::EmbeddingFailure(format!(
                    "entry '{}' embedded with dimension {} (index dimension is {dimension})",
                    entry.id,
                    embedding.len()
                )));
            }
            debug!(entry_id = %entry.id, dim = embedding.len(), "entry embedded");
            indexed.push(IndexedEntry { entry, embedding });
        }

        info!(entries = indexed.len(), dimension, "retrieval index built");
        Ok(Self { entries: indexed, dimension })
    }

    /// Return the `top_k` nearest entries, strictly descending by score,
    /// ties broken by ascending entry id.
    ///
    /// `top_k` outside `[1, entry_count]` is an `InvalidArgument`, as is a
    /// query vector whose dimension does not match the index.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievalHit<'_>>> {
        if top_k == 0 || top_k > self.entries.len() {
            return Err(GuichetError::InvalidArgument(format!(
                "top_k must be in [1, {}], got {top_k}",
                self.entries.len()
            )));
        }
        if query.len() != self.dimension {
            return Err(GuichetError::InvalidArgument(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut hits: Vec<RetrievalHit<'_>> = self
            .entries
            .iter()
            .map(|ie| RetrievalHit {
                entry: &ie.entry,
                score: clamped_cosine(query, &ie.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entry.id.cmp(&b.entry.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<&KnowledgeEntry> {
        self.entries.iter().find(|ie| ie.entry.id == id).map(|ie| &ie.entry)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The indexed entries, in load order.
    pub fn entries(&self) -> impl Iterator<Item = &KnowledgeEntry> {
        self.entries.iter().map(|ie| &ie.entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cosine similarity clamped to [0, 1]: zero-norm vectors score 0, and
/// negative similarity is reported as 0 rather than remapped via
/// `(cos + 1) / 2`. Off-topic questions therefore score 0 against every
/// entry and land under the ignorance threshold.
fn clamped_cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic embedder: maps marker words to fixed axes so tests can
    /// steer similarity without a model.
    struct AxisEmbedder;

    #[async_trait]
    impl TextEmbedder for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let t = text.to_lowercase();
            if t.contains("échec") {
                return Err(GuichetError::EmbeddingFailure("marked entry".into()));
            }
            let mut v = vec![0.0f32; 3];
            if t.contains("naissance") {
                v[0] = 1.0;
            }
            if t.contains("déchetterie") {
                v[1] = 1.0;
            }
            if t.contains("piscine") {
                v[2] = 1.0;
            }
            Ok(v)
        }
    }

    fn entry(id: &str, question: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.into(),
            theme: "test".into(),
            question: question.into(),
            answer: "Réponse.".into(),
        }
    }

    async fn sample_index() -> RetrievalIndex {
        RetrievalIndex::build(
            vec![
                entry("EC001", "Comment obtenir un acte de naissance ?"),
                entry("DE001", "Quels sont les horaires de la déchetterie ?"),
                entry("SP001", "Quels sont les tarifs de la piscine ?"),
            ],
            &AxisEmbedder,
        )
        .await
        .unwrap()
    }

    #[test]
    fn cosine_identical_vectors() {
        let sim = clamped_cosine(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let sim = clamped_cosine(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_negative_clamps_to_zero() {
        let sim = clamped_cosine(&[1.0, 0.0], &[-1.0, 0.0]);
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        assert_eq!(clamped_cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn search_descends_by_score() {
        let index = sample_index().await;
        // leans towards naissance with a touch of déchetterie
        let hits = index.search(&[1.0, 0.3, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].entry.id, "EC001");
        assert_eq!(hits[1].entry.id, "DE001");
        assert!(hits[0].score > hits[1].score);
        assert!(hits[1].score >= hits[2].score);
        for h in &hits {
            assert!((0.0..=1.0).contains(&h.score));
        }
    }

    #[tokio::test]
    async fn search_is_deterministic() {
        let index = sample_index().await;
        let a = index.search(&[0.5, 0.5, 0.0], 3).unwrap();
        let b = index.search(&[0.5, 0.5, 0.0], 3).unwrap();
        let ids_a: Vec<_> = a.iter().map(|h| h.entry.id.as_str()).collect();
        let ids_b: Vec<_> = b.iter().map(|h| h.entry.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[tokio::test]
    async fn search_breaks_ties_by_ascending_id() {
        // two entries on the same axis → identical scores
        let index = RetrievalIndex::build(
            vec![
                entry("B002", "Acte de naissance en ligne ?"),
                entry("A001", "Demande d'acte de naissance ?"),
            ],
            &AxisEmbedder,
        )
        .await
        .unwrap();
        let hits = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].entry.id, "A001");
        assert_eq!(hits[1].entry.id, "B002");
        assert_eq!(hits[0].score, hits[1].score);
    }

    #[tokio::test]
    async fn search_rejects_bad_top_k() {
        let index = sample_index().await;
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 0),
            Err(GuichetError::InvalidArgument(_))
        ));
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 4),
            Err(GuichetError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn search_rejects_dimension_mismatch() {
        let index = sample_index().await;
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(GuichetError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn build_is_all_or_nothing() {
        let res = RetrievalIndex::build(
            vec![
                entry("EC001", "Comment obtenir un acte de naissance ?"),
                entry("XX001", "Question en échec d'embedding"),
            ],
            &AxisEmbedder,
        )
        .await;
        assert!(matches!(res, Err(GuichetError::EmbeddingFailure(_))));
    }

    #[tokio::test]
    async fn get_and_contains() {
        let index = sample_index().await;
        assert!(index.contains_id("EC001"));
        assert!(!index.contains_id("ZZ999"));
        assert_eq!(index.get("DE001").unwrap().question, "Quels sont les horaires de la déchetterie ?");
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
    }
}

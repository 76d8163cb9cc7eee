//! Dataset loading: FAQ knowledge base, golden question set, and optional
//! external assessments. All three are JSON files; the FAQ and golden set
//! accept either a bare array or the wrapped object form of the source
//! datasets.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use guichet_bench::{Assessment, AssessmentSet};
use guichet_core::error::{GuichetError, Result};
use guichet_core::types::{KnowledgeEntry, ReferenceItem, StrategyKind};

#[derive(Deserialize)]
#[serde(untagged)]
enum FaqFile {
    Bare(Vec<KnowledgeEntry>),
    Wrapped { faq: Vec<KnowledgeEntry> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GoldenFile {
    Bare(Vec<ReferenceItem>),
    Wrapped { golden_set: Vec<ReferenceItem> },
}

#[derive(Debug, Deserialize)]
struct AssessmentRow {
    item_id: String,
    strategy: StrategyKind,
    #[serde(default)]
    relevance: f64,
    #[serde(default)]
    hallucinated: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AssessmentFile {
    Bare(Vec<AssessmentRow>),
    Wrapped { assessments: Vec<AssessmentRow> },
}

pub fn load_faq(path: &Path) -> Result<Vec<KnowledgeEntry>> {
    parse_faq(&read(path)?)
        .map_err(|e| GuichetError::Config(format!("FAQ file {}: {e}", path.display())))
}

pub fn load_golden(path: &Path) -> Result<Vec<ReferenceItem>> {
    parse_golden(&read(path)?)
        .map_err(|e| GuichetError::Config(format!("golden set {}: {e}", path.display())))
}

pub fn load_assessments(path: &Path) -> Result<AssessmentSet> {
    parse_assessments(&read(path)?)
        .map_err(|e| GuichetError::Config(format!("assessments {}: {e}", path.display())))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| GuichetError::Config(format!("cannot read {}: {e}", path.display())))
}

fn parse_faq(text: &str) -> Result<Vec<KnowledgeEntry>> {
    let parsed: FaqFile =
        serde_json::from_str(text).map_err(|e| GuichetError::Config(e.to_string()))?;
    let entries = match parsed {
        FaqFile::Bare(v) => v,
        FaqFile::Wrapped { faq } => faq,
    };
    if entries.is_empty() {
        return Err(GuichetError::Config("no FAQ entries".into()));
    }
    ensure_unique_ids(entries.iter().map(|e| e.id.as_str()))?;
    Ok(entries)
}

fn parse_golden(text: &str) -> Result<Vec<ReferenceItem>> {
    let parsed: GoldenFile =
        serde_json::from_str(text).map_err(|e| GuichetError::Config(e.to_string()))?;
    let items = match parsed {
        GoldenFile::Bare(v) => v,
        GoldenFile::Wrapped { golden_set } => golden_set,
    };
    if items.is_empty() {
        return Err(GuichetError::Config("no golden-set items".into()));
    }
    ensure_unique_ids(items.iter().map(|i| i.id.as_str()))?;
    Ok(items)
}

fn parse_assessments(text: &str) -> Result<AssessmentSet> {
    let parsed: AssessmentFile =
        serde_json::from_str(text).map_err(|e| GuichetError::Config(e.to_string()))?;
    let rows = match parsed {
        AssessmentFile::Bare(v) => v,
        AssessmentFile::Wrapped { assessments } => assessments,
    };
    let mut set = AssessmentSet::default();
    for row in rows {
        set.insert(row.item_id, row.strategy, Assessment {
            relevance: row.relevance,
            hallucinated: row.hallucinated,
        });
    }
    Ok(set)
}

fn ensure_unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(GuichetError::Config(format!("duplicate id '{id}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guichet_core::types::QuestionType;

    #[test]
    fn faq_accepts_bare_array() {
        let entries = parse_faq(
            r#"[
                {"id": "EC001", "theme": "état civil",
                 "question": "Comment obtenir un acte de naissance ?",
                 "answer": "En mairie ou sur service-public.fr."}
            ]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "EC001");
    }

    #[test]
    fn faq_accepts_wrapped_object() {
        let entries = parse_faq(
            r#"{"faq": [
                {"id": "DE001", "question": "Horaires déchetterie ?", "answer": "9h-18h."}
            ]}"#,
        )
        .unwrap();
        assert_eq!(entries[0].id, "DE001");
        // theme is optional in the source files
        assert!(entries[0].theme.is_empty());
    }

    #[test]
    fn empty_faq_is_rejected() {
        assert!(parse_faq("[]").is_err());
        assert!(parse_faq(r#"{"faq": []}"#).is_err());
    }

    #[test]
    fn duplicate_faq_ids_are_rejected() {
        let err = parse_faq(
            r#"[
                {"id": "EC001", "question": "a", "answer": "b"},
                {"id": "EC001", "question": "c", "answer": "d"}
            ]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("EC001"));
    }

    #[test]
    fn golden_set_parses_french_aliases() {
        let items = parse_golden(
            r#"{"golden_set": [
                {"id": "Q001", "type": "direct_match",
                 "question": "Comment obtenir un acte de naissance ?",
                 "reference_entry_id": "EC001",
                 "expected_keywords": ["mairie", "acte de naissance"],
                 "difficulty": "facile"},
                {"id": "Q002", "type": "hors_sujet",
                 "question": "Quel est le meilleur forfait 5G ?",
                 "difficulty": "difficile"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].question_type, QuestionType::DirectMatch);
        assert_eq!(items[1].question_type, QuestionType::OffTopic);
        assert!(items[1].expected_keywords.is_empty());
    }

    #[test]
    fn assessments_build_a_keyed_set() {
        let set = parse_assessments(
            r#"[
                {"item_id": "Q001", "strategy": "rag", "relevance": 0.9},
                {"item_id": "Q001", "strategy": "llm_only", "relevance": 0.7, "hallucinated": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        let rag = set.get("Q001", StrategyKind::Rag).unwrap();
        assert_eq!(rag.relevance, 0.9);
        assert!(!rag.hallucinated);
        assert!(set.get("Q001", StrategyKind::LlmOnly).unwrap().hallucinated);
        assert!(set.get("Q002", StrategyKind::Rag).is_none());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_faq(Path::new("/nonexistent/faq.json")).unwrap_err();
        assert!(matches!(err, GuichetError::Config(_)));
    }
}

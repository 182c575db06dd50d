use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::entities::{providers, sorted_dates};
use super::relevance::{classify_relevance, ConditionIndex, RelevanceThresholds};
use super::types::{EntityExtractor, SimilarityService};
use super::AnalysisError;
use crate::models::{Document, Evidence, EvidenceType, Relevance};
use crate::pipeline::ingestion::extract_icd_codes;
use crate::pipeline_config::AnalysisConfig;

/// Phrases highlighted wherever they occur in an evidence fragment.
pub const KEY_PHRASES: &[&str] = &[
    "diagnosed with",
    "nexus",
    "caused by",
    "due to",
    "secondary to",
    "aggravated by",
    "more likely than not",
];

static FRAGMENT_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").unwrap());
static KEY_PHRASE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    KEY_PHRASES
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", regex::escape(p))).unwrap())
        .collect()
});

/// Confidence bonuses: (trigger phrases, bonus). Each group applies at most once.
const CONFIDENCE_BONUSES: &[(&[&str], f32)] = &[
    (&["diagnosed", "diagnosis"], 0.1),
    (&["nexus", "due to", "caused by"], 0.15),
    (&["more likely than not", "at least as likely"], 0.15),
];

/// Turns document pages into evidence for a fixed set of claimed conditions.
pub struct EvidenceExtractor<'a> {
    similarity: &'a dyn SimilarityService,
    entities: &'a dyn EntityExtractor,
    index: &'a ConditionIndex,
    config: &'a AnalysisConfig,
}

impl<'a> EvidenceExtractor<'a> {
    pub fn new(
        similarity: &'a dyn SimilarityService,
        entities: &'a dyn EntityExtractor,
        index: &'a ConditionIndex,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            similarity,
            entities,
            index,
            config,
        }
    }

    /// Evidence from every page of `doc`, in page then fragment order.
    pub fn extract(&self, doc: &Document) -> Result<Vec<Evidence>, AnalysisError> {
        let evidence_type = doc.classified_type.evidence_type();
        let mut evidence = Vec::new();
        let mut fragments_seen = 0usize;

        for page in &doc.pages {
            for fragment in fragments(&page.text, self.config.min_fragment_chars) {
                fragments_seen += 1;
                if let Some(item) = self.fragment_evidence(&doc.id, page.page_number, fragment, evidence_type)? {
                    evidence.push(item);
                }
            }
        }

        debug!(
            document_id = %doc.id,
            fragments = fragments_seen,
            evidence = evidence.len(),
            "Evidence extracted"
        );
        Ok(evidence)
    }

    fn fragment_evidence(
        &self,
        document_id: &str,
        page_number: usize,
        fragment: &str,
        evidence_type: EvidenceType,
    ) -> Result<Option<Evidence>, AnalysisError> {
        let thresholds = RelevanceThresholds::from(self.config);
        let (relevance, condition) = classify_relevance(self.similarity, self.index, fragment, thresholds)?;
        let Some(condition) = condition else {
            return Ok(None);
        };

        let entities = self.entities.extract(fragment)?;
        let text = truncate_chars(fragment, self.config.evidence_text_max_chars);
        let highlights = find_highlights(fragment, &condition)
            .into_iter()
            .filter(|&(_, end)| end <= text.len())
            .collect();

        Ok(Some(Evidence {
            document_id: document_id.to_string(),
            page_number,
            text: text.to_string(),
            evidence_type,
            relevance,
            confidence: evidence_confidence(fragment, relevance),
            condition: Some(condition),
            date: sorted_dates(&entities).into_iter().next(),
            provider: providers(&entities).into_iter().next(),
            diagnosis_codes: extract_icd_codes(fragment),
            highlights,
        }))
    }
}

/// Blank-line separated fragments, trimmed, dropping those under `min_chars`.
pub fn fragments(text: &str, min_chars: usize) -> impl Iterator<Item = &str> {
    FRAGMENT_BREAK
        .split(text)
        .map(str::trim)
        .filter(move |f| f.chars().count() >= min_chars)
}

/// Base score for the relevance plus phrase bonuses, capped at 1.0.
pub fn evidence_confidence(text: &str, relevance: Relevance) -> f32 {
    let lower = text.to_lowercase();
    let bonus: f32 = CONFIDENCE_BONUSES
        .iter()
        .filter(|(triggers, _)| triggers.iter().any(|t| lower.contains(t)))
        .map(|(_, b)| b)
        .sum();
    (relevance.base_confidence() + bonus).min(1.0)
}

/// Byte spans of the condition name, then of each key phrase. Case-insensitive;
/// overlapping spans are kept.
pub fn find_highlights(text: &str, condition: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    if !condition.is_empty() {
        if let Ok(re) = Regex::new(&format!("(?i){}", regex::escape(condition))) {
            spans.extend(re.find_iter(text).map(|m| (m.start(), m.end())));
        }
    }
    for re in KEY_PHRASE_PATTERNS.iter() {
        spans.extend(re.find_iter(text).map(|m| (m.start(), m.end())));
    }
    spans
}

/// At most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentType, Page};
    use crate::pipeline::analysis::embedder::ScriptedSimilarity;
    use crate::pipeline::analysis::entities::RuleEntityExtractor;
    use crate::pipeline::analysis::test_support::document;
    use chrono::NaiveDate;

    fn extract(service: &ScriptedSimilarity, conditions: &[&str], doc: &Document) -> Vec<Evidence> {
        let names: Vec<String> = conditions.iter().map(|s| s.to_string()).collect();
        let index = ConditionIndex::build(service, &names).unwrap();
        let config = AnalysisConfig::default();
        EvidenceExtractor::new(service, &RuleEntityExtractor, &index, &config)
            .extract(doc)
            .unwrap()
    }

    #[test]
    fn diagnosed_due_to_scenario_clamps_to_one() {
        let text = "Patient diagnosed with PTSD due to combat trauma in service";
        assert_eq!(evidence_confidence(text, Relevance::Direct), 1.0);
    }

    #[test]
    fn supporting_without_bonus_stays_at_base() {
        assert!((evidence_confidence("Complains of ringing ears", Relevance::Supporting) - 0.5).abs() < 1e-6);
        let nexus = "It is at least as likely as not caused by noise exposure";
        assert!((evidence_confidence(nexus, Relevance::Supporting) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn highlights_condition_then_phrases() {
        let text = "Tinnitus diagnosed with audiogram; tinnitus due to noise";
        let spans = find_highlights(text, "tinnitus");
        assert_eq!(spans, vec![(0, 8), (35, 43), (9, 23), (44, 50)]);
        assert_eq!(&text[9..23], "diagnosed with");
        assert_eq!(&text[44..50], "due to");
    }

    #[test]
    fn fragments_split_on_blank_lines_and_drop_noise() {
        let text = "Short one\n\nThis fragment is long enough to keep.\n  \n   Another paragraph long enough.  ";
        let got: Vec<&str> = fragments(text, 20).collect();
        assert_eq!(got, vec!["This fragment is long enough to keep.", "Another paragraph long enough."]);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn builds_evidence_per_page_and_drops_neutral() {
        let doc = document(
            "doc-1",
            DocumentType::MedicalRecord,
            vec![
                Page::text(1, "Routine dental cleaning performed today.\n\nSeen 03/15/2019 by Dr. Alice Moreno: tinnitus diagnosed, ICD H93.1."),
                Page::text(2, "Follow-up: tinnitus persists, ringing worse at night."),
            ],
        );
        let service = ScriptedSimilarity::new(0.2).rule("tinnitus", "tinnitus", 0.85);
        let evidence = extract(&service, &["tinnitus"], &doc);

        assert_eq!(evidence.len(), 2);
        let first = &evidence[0];
        assert_eq!(first.page_number, 1);
        assert_eq!(first.relevance, Relevance::Direct);
        assert_eq!(first.evidence_type, EvidenceType::MedicalRecord);
        assert_eq!(first.condition.as_deref(), Some("tinnitus"));
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2019, 3, 15));
        assert_eq!(first.provider.as_deref(), Some("Dr. Alice Moreno"));
        assert_eq!(first.diagnosis_codes, vec!["H93.1"]);
        assert!((first.confidence - 0.9).abs() < 1e-6);
        assert_eq!(evidence[1].page_number, 2);
        assert!(evidence.iter().all(|e| e.relevance != Relevance::Neutral));
    }

    #[test]
    fn long_fragments_are_truncated_and_highlights_clipped() {
        let text = format!("{} tinnitus", "x".repeat(600));
        let doc = document("doc-2", DocumentType::Other, vec![Page::text(1, text)]);
        let service = ScriptedSimilarity::new(0.5);
        let evidence = extract(&service, &["tinnitus"], &doc);

        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].text.chars().count(), 500);
        assert!(evidence[0].highlights.is_empty());
        assert_eq!(evidence[0].relevance, Relevance::Supporting);
    }
}

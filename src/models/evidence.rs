use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{EvidenceType, Relevance};

/// A text fragment judged relevant to a claimed condition.
///
/// `condition` is the normalized (trimmed, lower-case) claimed-condition name and
/// is the join key into [`MedicalCondition::name`]. Neutral fragments never
/// become evidence, so `relevance` is never [`Relevance::Neutral`] here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub document_id: String,
    pub page_number: usize,
    pub text: String,
    pub evidence_type: EvidenceType,
    pub relevance: Relevance,
    pub confidence: f32,
    pub condition: Option<String>,
    pub date: Option<NaiveDate>,
    pub provider: Option<String>,
    pub diagnosis_codes: Vec<String>,
    /// Byte ranges `(start, end)` into `text`. Spans may overlap.
    pub highlights: Vec<(usize, usize)>,
}

/// Evidence grouped under one claimed condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalCondition {
    pub name: String,
    pub icd10_codes: Vec<String>,
    pub evidence_items: Vec<Evidence>,
    pub in_service_event: Option<String>,
    pub nexus_statement: Option<String>,
    pub continuity_evidence: Vec<Evidence>,
    pub severity_rating: Option<u8>,
    pub secondary_to: Option<String>,
}

impl MedicalCondition {
    /// Mean confidence across this condition's evidence; 0.0 when empty.
    pub fn mean_confidence(&self) -> f32 {
        if self.evidence_items.is_empty() {
            return 0.0;
        }
        let total: f32 = self.evidence_items.iter().map(|e| e.confidence).sum();
        total / self.evidence_items.len() as f32
    }
}

/// Normalize a condition name into its join-key form.
pub fn normalize_condition(name: &str) -> String {
    name.trim().to_lowercase()
}

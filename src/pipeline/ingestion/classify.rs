use std::sync::LazyLock;

use regex::Regex;

use crate::models::DocumentType;

use super::types::DocumentClassifier;

static STR_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bstr\b").unwrap());

/// Ordered keyword rules over lower-cased text. First match wins.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl DocumentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> DocumentType {
        let t = text.to_lowercase();
        let has = |needle: &str| t.contains(needle);

        if has("dd form 214") || has("dd214") {
            DocumentType::Dd214
        } else if has("va form 21-526") {
            DocumentType::VaForm526ez
        } else if has("disability benefits questionnaire") || has("dbq") {
            DocumentType::Dbq
        } else if has("medical opinion") && has("nexus") {
            DocumentType::NexusLetter
        } else if has("buddy statement") || has("lay statement") {
            DocumentType::BuddyStatement
        } else if has("diagnosis") || has("treatment") || has("medical record") {
            DocumentType::MedicalRecord
        } else if has("service treatment record") || STR_WORD.is_match(&t) {
            DocumentType::ServiceTreatmentRecord
        } else if has("rating decision") {
            DocumentType::RatingDecision
        } else if has("c&p exam") || has("compensation and pension") {
            DocumentType::CpExam
        } else {
            DocumentType::Other
        }
    }
}

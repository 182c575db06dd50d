use std::sync::LazyLock;

use regex::Regex;

use super::types::{EntityExtractor, EntityLabel};
use super::AnalysisError;
use crate::models::{normalize_condition, ClaimType, Document, DocumentType};

static CLAIM_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?im)claiming?\s+(?:for\s+)?(.+?)(?:\.|,|;|$)").unwrap(),
        Regex::new(r"(?im)conditions?\s+claimed:\s*(.+?)(?:\.|$)").unwrap(),
        Regex::new(r"(?im)disability\s+for\s+(.+?)(?:\.|,|$)").unwrap(),
    ]
});

/// Normalize names and drop blanks and duplicates, keeping first occurrence.
pub fn normalize_claimed(conditions: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in conditions.iter().map(|c| normalize_condition(c)) {
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Claimed conditions read off application forms (VA Form 21-526EZ).
pub fn discover_claimed_conditions(
    documents: &[Document],
    entities: &dyn EntityExtractor,
) -> Result<Vec<String>, AnalysisError> {
    let mut found = Vec::new();
    for doc in documents
        .iter()
        .filter(|d| d.classified_type == DocumentType::VaForm526ez)
    {
        found.extend(
            entities
                .extract(&doc.full_text)?
                .into_iter()
                .filter(|e| e.label == EntityLabel::Condition)
                .map(|e| e.text),
        );
        for pattern in CLAIM_PATTERNS.iter() {
            found.extend(pattern.captures_iter(&doc.full_text).map(|c| c[1].to_string()));
        }
    }
    Ok(normalize_claimed(&found))
}

/// Claim type implied by the claimed condition names.
pub fn claim_type_for(conditions: &[String]) -> ClaimType {
    let joined = conditions.join(" ").to_lowercase();
    if joined.contains("increase") {
        ClaimType::Increase
    } else if joined.contains("secondary") {
        ClaimType::Secondary
    } else if ["ptsd", "mst", "trauma"].iter().any(|t| joined.contains(t)) {
        ClaimType::Ptsd
    } else {
        ClaimType::Initial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::entities::RuleEntityExtractor;
    use crate::pipeline::analysis::test_support::text_document;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalizes_and_dedupes_in_order() {
        assert_eq!(
            normalize_claimed(&names(&[" Tinnitus", "PTSD", "tinnitus ", "  "])),
            names(&["tinnitus", "ptsd"])
        );
    }

    #[test]
    fn discovers_from_application_forms_only() {
        let form = text_document(
            "form",
            DocumentType::VaForm526ez,
            "VA Form 21-526EZ\nConditions claimed: Sleep Apnea.\nVeteran is claiming for knee pain, and reports tinnitus.\nSeeks disability for lower back strain.",
        );
        let other = text_document("note", DocumentType::MedicalRecord, "Claiming for migraines.");
        let found = discover_claimed_conditions(&[form, other], &RuleEntityExtractor).unwrap();
        assert_eq!(found, names(&["tinnitus", "knee pain", "sleep apnea", "lower back strain"]));
    }

    #[test]
    fn claim_type_precedence() {
        assert_eq!(claim_type_for(&names(&["knee pain increase", "ptsd"])), ClaimType::Increase);
        assert_eq!(claim_type_for(&names(&["sleep apnea secondary to ptsd"])), ClaimType::Secondary);
        assert_eq!(claim_type_for(&names(&["mst"])), ClaimType::Ptsd);
        assert_eq!(claim_type_for(&names(&["tinnitus"])), ClaimType::Initial);
        assert_eq!(claim_type_for(&[]), ClaimType::Initial);
    }
}

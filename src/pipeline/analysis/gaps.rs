use super::types::KnowledgeBase;
use crate::models::MedicalCondition;

const MIN_CONTINUITY_ITEMS: usize = 2;

/// Gap keyword and the recommendation it maps to. First keyword found wins.
const GAP_RECOMMENDATIONS: &[(&str, &str)] = &[
    ("nexus", "Obtain medical opinion letter from treating physician"),
    ("in-service", "Request service treatment records from National Archives"),
    ("continuity", "Gather additional treatment records showing ongoing symptoms"),
    ("diagnosis", "Schedule appointment for formal diagnosis and ICD coding"),
];

/// Missing evidence messages for every claimed condition, in claimed order.
pub fn identify_gaps(conditions: &[MedicalCondition], claimed: &[String]) -> Vec<String> {
    let mut gaps = Vec::new();
    for name in claimed {
        let Some(condition) = conditions.iter().find(|c| &c.name == name) else {
            gaps.push(format!("No evidence found for {name}"));
            continue;
        };
        if condition.in_service_event.is_none() {
            gaps.push(format!("Missing in-service event documentation for {name}"));
        }
        if condition.nexus_statement.is_none() {
            gaps.push(format!("Missing nexus letter connecting {name} to service"));
        }
        if condition.continuity_evidence.len() < MIN_CONTINUITY_ITEMS {
            gaps.push(format!("Insufficient continuity of care evidence for {name}"));
        }
        if condition.icd10_codes.is_empty() {
            gaps.push(format!("Missing formal diagnosis with ICD codes for {name}"));
        }
    }
    gaps
}

/// Recommendation template for a single gap message, if any keyword applies.
pub fn recommendation_for_gap(gap: &str) -> Option<&'static str> {
    let lower = gap.to_lowercase();
    GAP_RECOMMENDATIONS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, rec)| *rec)
}

/// Gap templates (one per gap), then weak-evidence nudges, then
/// secondary-condition suggestions from the knowledge base.
pub fn generate_recommendations(
    conditions: &[MedicalCondition],
    gaps: &[String],
    knowledge: &dyn KnowledgeBase,
    weak_evidence_threshold: f32,
) -> Vec<String> {
    let mut recommendations: Vec<String> = gaps
        .iter()
        .filter_map(|g| recommendation_for_gap(g))
        .map(str::to_string)
        .collect();

    for condition in conditions {
        if !condition.evidence_items.is_empty() && condition.mean_confidence() < weak_evidence_threshold {
            recommendations.push(format!(
                "Strengthen evidence for {} with additional documentation",
                condition.name
            ));
        }
    }

    for condition in conditions {
        let secondaries = knowledge.secondary_conditions_of(&condition.name);
        if !secondaries.is_empty() {
            recommendations.push(format!(
                "Consider claiming secondary conditions to {}: {}",
                condition.name,
                secondaries.join(", ")
            ));
        }
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EvidenceType;
    use crate::pipeline::analysis::knowledge::StaticKnowledgeBase;
    use crate::pipeline::analysis::test_support::{condition, evidence};

    fn claimed(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unmatched_claim_reports_no_evidence() {
        let gaps = identify_gaps(&[], &claimed(&["sleep apnea"]));
        assert_eq!(gaps, vec!["No evidence found for sleep apnea"]);
    }

    #[test]
    fn bare_condition_surfaces_every_gap() {
        let c = condition("tinnitus", vec![evidence("tinnitus", EvidenceType::LayStatement, "ringing")]);
        let gaps = identify_gaps(&[c], &claimed(&["tinnitus"]));
        assert_eq!(
            gaps,
            vec![
                "Missing in-service event documentation for tinnitus",
                "Missing nexus letter connecting tinnitus to service",
                "Insufficient continuity of care evidence for tinnitus",
                "Missing formal diagnosis with ICD codes for tinnitus",
            ]
        );
    }

    #[test]
    fn gaps_map_to_templates() {
        assert_eq!(
            recommendation_for_gap("Missing nexus letter connecting tinnitus to service"),
            Some("Obtain medical opinion letter from treating physician")
        );
        assert_eq!(
            recommendation_for_gap("Missing in-service event documentation for ptsd"),
            Some("Request service treatment records from National Archives")
        );
        assert_eq!(
            recommendation_for_gap("Insufficient continuity of care evidence for ptsd"),
            Some("Gather additional treatment records showing ongoing symptoms")
        );
        assert_eq!(
            recommendation_for_gap("Missing formal diagnosis with ICD codes for ptsd"),
            Some("Schedule appointment for formal diagnosis and ICD coding")
        );
        assert_eq!(recommendation_for_gap("No evidence found for ptsd"), None);
    }

    #[test]
    fn weak_and_secondary_recommendations_follow_gap_templates() {
        let mut weak = evidence("ptsd", EvidenceType::LayStatement, "nightmares");
        weak.confidence = 0.4;
        let conditions = vec![condition("ptsd", vec![weak])];
        let gaps = vec!["Missing nexus letter connecting ptsd to service".to_string()];

        let recs = generate_recommendations(&conditions, &gaps, &StaticKnowledgeBase::default(), 0.5);
        assert_eq!(recs[0], "Obtain medical opinion letter from treating physician");
        assert_eq!(recs[1], "Strengthen evidence for ptsd with additional documentation");
        assert!(recs[2].starts_with("Consider claiming secondary conditions to ptsd: sleep apnea"));
        assert_eq!(recs.len(), 3);
    }
}

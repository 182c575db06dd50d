use crate::models::MedicalCondition;

const IN_SERVICE_WEIGHT: f32 = 0.25;
const NEXUS_WEIGHT: f32 = 0.35;
const CONTINUITY_WEIGHT: f32 = 0.2;
const DIAGNOSIS_WEIGHT: f32 = 0.1;

const COMPLETENESS_BONUS: f32 = 0.1;
const STRONG_CONTINUITY_COUNT: usize = 3;

/// Weighted indicator sum scaled by the condition's mean evidence confidence.
pub fn condition_strength(condition: &MedicalCondition) -> f32 {
    let mut strength = 0.0;
    if condition.in_service_event.is_some() {
        strength += IN_SERVICE_WEIGHT;
    }
    if condition.nexus_statement.is_some() {
        strength += NEXUS_WEIGHT;
    }
    if !condition.continuity_evidence.is_empty() {
        strength += CONTINUITY_WEIGHT;
    }
    if !condition.icd10_codes.is_empty() {
        strength += DIAGNOSIS_WEIGHT;
    }
    strength * condition.mean_confidence()
}

/// Mean per-condition strength; 0.0 with no conditions.
pub fn evidence_strength(conditions: &[MedicalCondition]) -> f32 {
    if conditions.is_empty() {
        return 0.0;
    }
    let total: f32 = conditions.iter().map(condition_strength).sum();
    (total / conditions.len() as f32).clamp(0.0, 1.0)
}

/// Strength plus completeness bonuses per condition, capped at `cap`.
pub fn confidence_score(conditions: &[MedicalCondition], strength: f32, cap: f32) -> f32 {
    if conditions.is_empty() {
        return 0.0;
    }
    let bonus: f32 = conditions
        .iter()
        .map(|c| {
            let hits = [
                c.nexus_statement.is_some(),
                c.in_service_event.is_some(),
                c.continuity_evidence.len() >= STRONG_CONTINUITY_COUNT,
            ];
            hits.iter().filter(|&&h| h).count() as f32 * COMPLETENESS_BONUS
        })
        .sum();
    (strength + bonus).clamp(0.0, cap)
}

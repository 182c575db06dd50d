use crate::models::{Evidence, EvidenceType, MedicalCondition};

/// Group evidence under each claimed condition, in claimed order.
///
/// Conditions without evidence are left out. Evidence keeps extraction order.
pub fn aggregate_conditions(evidence: &[Evidence], claimed: &[String]) -> Vec<MedicalCondition> {
    claimed
        .iter()
        .filter_map(|name| {
            let items: Vec<Evidence> = evidence
                .iter()
                .filter(|e| e.condition.as_deref() == Some(name.as_str()))
                .cloned()
                .collect();
            (!items.is_empty()).then(|| build_condition(name, items))
        })
        .collect()
}

fn build_condition(name: &str, items: Vec<Evidence>) -> MedicalCondition {
    let in_service_event = items
        .iter()
        .find(|e| e.evidence_type == EvidenceType::ServiceRecord)
        .map(|e| e.text.clone());

    let nexus_statement = items
        .iter()
        .find(|e| {
            let lower = e.text.to_lowercase();
            lower.contains("nexus") || lower.contains("caused by")
        })
        .map(|e| e.text.clone());

    let continuity_evidence = items
        .iter()
        .filter(|e| e.evidence_type == EvidenceType::MedicalRecord && e.date.is_some())
        .cloned()
        .collect();

    let mut icd10_codes: Vec<String> = Vec::new();
    for code in items.iter().flat_map(|e| &e.diagnosis_codes) {
        if !icd10_codes.contains(code) {
            icd10_codes.push(code.clone());
        }
    }

    MedicalCondition {
        name: name.to_string(),
        icd10_codes,
        evidence_items: items,
        in_service_event,
        nexus_statement,
        continuity_evidence,
        severity_rating: None,
        secondary_to: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::test_support::{dated, evidence};

    fn claimed(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn conditions_without_evidence_are_dropped() {
        let items = vec![evidence("tinnitus", EvidenceType::MedicalRecord, "ringing")];
        let conditions = aggregate_conditions(&items, &claimed(&["ptsd", "tinnitus"]));
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].name, "tinnitus");
    }

    #[test]
    fn derives_in_service_nexus_and_continuity() {
        let mut coded = dated(evidence("tinnitus", EvidenceType::MedicalRecord, "Audiology visit"), 2019, 1, 5);
        coded.diagnosis_codes = vec!["H93.1".into()];
        let mut coded_again = evidence("tinnitus", EvidenceType::CpExam, "Exam confirms");
        coded_again.diagnosis_codes = vec!["H93.1".into(), "H90.3".into()];

        let items = vec![
            evidence("tinnitus", EvidenceType::LayStatement, "He complained of ringing"),
            evidence("tinnitus", EvidenceType::ServiceRecord, "Artillery crewman 1990-1994"),
            evidence("tinnitus", EvidenceType::ServiceRecord, "Second service entry"),
            coded,
            evidence("tinnitus", EvidenceType::MedicalRecord, "Undated note"),
            evidence("tinnitus", EvidenceType::NexusLetter, "Tinnitus is CAUSED BY acoustic trauma"),
            coded_again,
            evidence("ptsd", EvidenceType::MedicalRecord, "Nexus for PTSD"),
        ];
        let conditions = aggregate_conditions(&items, &claimed(&["tinnitus"]));
        let c = &conditions[0];

        assert_eq!(c.evidence_items.len(), 7);
        assert_eq!(c.in_service_event.as_deref(), Some("Artillery crewman 1990-1994"));
        assert_eq!(c.nexus_statement.as_deref(), Some("Tinnitus is CAUSED BY acoustic trauma"));
        assert_eq!(c.continuity_evidence.len(), 1);
        assert_eq!(c.continuity_evidence[0].text, "Audiology visit");
        assert_eq!(c.icd10_codes, vec!["H93.1", "H90.3"]);
    }

    #[test]
    fn missing_elements_stay_none() {
        let items = vec![evidence("ptsd", EvidenceType::LayStatement, "Nightmares since Iraq")];
        let c = &aggregate_conditions(&items, &claimed(&["ptsd"]))[0];
        assert!(c.in_service_event.is_none());
        assert!(c.nexus_statement.is_none());
        assert!(c.continuity_evidence.is_empty());
        assert!(c.icd10_codes.is_empty());
    }
}

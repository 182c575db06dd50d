use tracing::debug;

use super::types::KnowledgeBase;
use crate::models::{Document, EvidenceType, MedicalCondition};

const VIETNAM_MARKERS: &[&str] = &["vietnam", "republic of vietnam", "rvn"];
const GULF_WAR_MARKERS: &[&str] = &["desert storm", "desert shield", "iraq", "kuwait"];
const BURN_PIT_MARKERS: &[&str] = &["iraq", "afghanistan", "djibouti", "syria", "jordan"];

/// Service eras and exposures detected in service records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceHistory {
    pub vietnam: bool,
    pub gulf_war: bool,
    pub burn_pit: bool,
}

impl ServiceHistory {
    /// Scan the text of every service-record document.
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut history = Self::default();
        for doc in documents
            .iter()
            .filter(|d| d.classified_type.evidence_type() == EvidenceType::ServiceRecord)
        {
            let text = doc.full_text.to_lowercase();
            let any = |markers: &[&str]| markers.iter().any(|m| text.contains(m));
            history.vietnam |= any(VIETNAM_MARKERS);
            history.gulf_war |= any(GULF_WAR_MARKERS);
            history.burn_pit |= any(BURN_PIT_MARKERS);
        }
        debug!(?history, "Service history scanned");
        history
    }
}

/// `"<name> (<program> presumptive)"` for each condition on an eligible program's list.
pub fn presumptive_conditions(
    history: ServiceHistory,
    conditions: &[MedicalCondition],
    knowledge: &dyn KnowledgeBase,
) -> Vec<String> {
    let programs = [
        (history.vietnam, "Agent Orange", knowledge.agent_orange_conditions()),
        (history.gulf_war, "Gulf War", knowledge.gulf_war_conditions()),
        (history.burn_pit, "PACT Act", knowledge.pact_act_conditions()),
    ];

    let mut out = Vec::new();
    for (eligible, program, listed) in programs {
        if !eligible {
            continue;
        }
        out.extend(
            conditions
                .iter()
                .filter(|c| listed.contains(&c.name))
                .map(|c| format!("{} ({program} presumptive)", c.name)),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;
    use crate::pipeline::analysis::knowledge::StaticKnowledgeBase;
    use crate::pipeline::analysis::test_support::{condition, text_document};

    #[test]
    fn vietnam_service_flags_agent_orange() {
        let docs = vec![text_document(
            "dd214",
            DocumentType::Dd214,
            "DD Form 214. Service in the Republic of Vietnam 1968-1969.",
        )];
        let history = ServiceHistory::from_documents(&docs);
        assert!(history.vietnam);
        assert!(!history.gulf_war);

        let conditions = vec![condition("diabetes", vec![]), condition("tinnitus", vec![])];
        let out = presumptive_conditions(history, &conditions, &StaticKnowledgeBase::default());
        assert_eq!(out, vec!["diabetes (Agent Orange presumptive)"]);
    }

    #[test]
    fn iraq_counts_for_gulf_war_and_burn_pits() {
        let docs = vec![text_document("dd214", DocumentType::Dd214, "Deployed to IRAQ 2004")];
        let history = ServiceHistory::from_documents(&docs);
        assert_eq!(
            history,
            ServiceHistory {
                vietnam: false,
                gulf_war: true,
                burn_pit: true
            }
        );
        let conditions = vec![condition("asthma", vec![]), condition("fibromyalgia", vec![])];
        let out = presumptive_conditions(history, &conditions, &StaticKnowledgeBase::default());
        assert_eq!(out, vec!["fibromyalgia (Gulf War presumptive)", "asthma (PACT Act presumptive)"]);
    }

    #[test]
    fn only_service_records_are_scanned() {
        let docs = vec![text_document(
            "letter",
            DocumentType::BuddyStatement,
            "We served together in Vietnam",
        )];
        assert_eq!(ServiceHistory::from_documents(&docs), ServiceHistory::default());
    }

    #[test]
    fn list_match_is_exact() {
        let history = ServiceHistory {
            vietnam: true,
            ..Default::default()
        };
        let conditions = vec![condition("Diabetes", vec![])];
        assert!(presumptive_conditions(history, &conditions, &StaticKnowledgeBase::default()).is_empty());
    }
}

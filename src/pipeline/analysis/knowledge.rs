use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::KnowledgeBase;
use super::AnalysisError;
use crate::models::normalize_condition;

/// Knowledge base backed by in-memory tables.
///
/// Keys are normalized condition names. Lookups try an exact key first, then
/// the first key (in sorted order) contained in the queried name, so
/// "chronic ptsd" still finds the "ptsd" entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticKnowledgeBase {
    pub secondary_conditions: BTreeMap<String, Vec<String>>,
    pub dbqs: BTreeMap<String, String>,
    pub agent_orange: Vec<String>,
    pub gulf_war: Vec<String>,
    pub pact_act: Vec<String>,
}

impl StaticKnowledgeBase {
    /// Load tables from JSON. Missing tables keep the built-in values.
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::KnowledgeBase(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AnalysisError> {
        let mut kb: Self = serde_json::from_str(raw)
            .map_err(|e| AnalysisError::KnowledgeBase(format!("Invalid knowledge base JSON: {e}")))?;
        kb.normalize_keys();
        Ok(kb)
    }

    fn normalize_keys(&mut self) {
        self.secondary_conditions = std::mem::take(&mut self.secondary_conditions)
            .into_iter()
            .map(|(k, v)| (normalize_condition(&k), v))
            .collect();
        self.dbqs = std::mem::take(&mut self.dbqs)
            .into_iter()
            .map(|(k, v)| (normalize_condition(&k), v))
            .collect();
    }
}

fn lookup<'a, V>(table: &'a BTreeMap<String, V>, condition: &str) -> Option<&'a V> {
    let name = normalize_condition(condition);
    table
        .get(&name)
        .or_else(|| table.iter().find(|(k, _)| name.contains(k.as_str())).map(|(_, v)| v))
}

impl KnowledgeBase for StaticKnowledgeBase {
    fn secondary_conditions_of(&self, condition: &str) -> Vec<String> {
        lookup(&self.secondary_conditions, condition)
            .cloned()
            .unwrap_or_default()
    }

    fn dbq_for(&self, condition: &str) -> Option<String> {
        lookup(&self.dbqs, condition).cloned()
    }

    fn agent_orange_conditions(&self) -> Vec<String> {
        self.agent_orange.clone()
    }

    fn gulf_war_conditions(&self) -> Vec<String> {
        self.gulf_war.clone()
    }

    fn pact_act_conditions(&self) -> Vec<String> {
        self.pact_act.clone()
    }
}

// ═══════════════════════════════════════════════════════════
// Built-in tables
// ═══════════════════════════════════════════════════════════

const SECONDARY_CONDITIONS: &[(&str, &[&str])] = &[
    ("ptsd", &["sleep apnea", "hypertension", "gerd", "erectile dysfunction"]),
    ("diabetes", &["peripheral neuropathy", "hypertension", "erectile dysfunction", "diabetic retinopathy"]),
    ("back pain", &["radiculopathy", "sciatica"]),
    ("knee pain", &["hip pain", "back pain"]),
    ("tbi", &["migraines", "depression", "tinnitus"]),
    ("traumatic brain injury", &["migraines", "depression", "tinnitus"]),
    ("hearing loss", &["tinnitus"]),
    ("sleep apnea", &["hypertension"]),
];

const DBQS: &[(&str, &str)] = &[
    ("ptsd", "PTSD (Initial) DBQ"),
    ("depression", "Mental Disorders DBQ"),
    ("anxiety", "Mental Disorders DBQ"),
    ("tinnitus", "Hearing Loss and Tinnitus DBQ"),
    ("hearing loss", "Hearing Loss and Tinnitus DBQ"),
    ("tbi", "Traumatic Brain Injury DBQ"),
    ("traumatic brain injury", "Traumatic Brain Injury DBQ"),
    ("back pain", "Back (Thoracolumbar Spine) Conditions DBQ"),
    ("knee pain", "Knee and Lower Leg Conditions DBQ"),
    ("sleep apnea", "Sleep Apnea DBQ"),
    ("diabetes", "Diabetes Mellitus DBQ"),
    ("hypertension", "Hypertension DBQ"),
    ("migraines", "Headaches (including Migraine Headaches) DBQ"),
    ("peripheral neuropathy", "Peripheral Nerves Conditions DBQ"),
];

const AGENT_ORANGE: &[&str] = &[
    "diabetes",
    "type 2 diabetes",
    "ischemic heart disease",
    "parkinson's disease",
    "prostate cancer",
    "peripheral neuropathy",
    "hypertension",
    "bladder cancer",
    "hypothyroidism",
    "chronic b-cell leukemia",
    "hodgkin's disease",
    "multiple myeloma",
    "non-hodgkin's lymphoma",
    "soft tissue sarcoma",
    "chloracne",
    "al amyloidosis",
    "respiratory cancers",
];

const GULF_WAR: &[&str] = &[
    "chronic fatigue syndrome",
    "fibromyalgia",
    "irritable bowel syndrome",
    "functional gastrointestinal disorders",
    "undiagnosed illness",
    "als",
];

const PACT_ACT: &[&str] = &[
    "asthma",
    "chronic bronchitis",
    "chronic sinusitis",
    "chronic rhinitis",
    "copd",
    "emphysema",
    "pulmonary fibrosis",
    "sarcoidosis",
    "constrictive bronchiolitis",
    "interstitial lung disease",
    "glioblastoma",
    "respiratory cancers",
];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for StaticKnowledgeBase {
    fn default() -> Self {
        Self {
            secondary_conditions: SECONDARY_CONDITIONS
                .iter()
                .map(|(k, v)| (k.to_string(), owned(v)))
                .collect(),
            dbqs: DBQS.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            agent_orange: owned(AGENT_ORANGE),
            gulf_war: owned(GULF_WAR),
            pact_act: owned(PACT_ACT),
        }
    }
}

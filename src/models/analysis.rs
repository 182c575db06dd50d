use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{ClaimType, EvidenceType};
use super::evidence::MedicalCondition;

/// One dated event on the claim timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub event_text: String,
    pub evidence_type: EvidenceType,
    pub condition: Option<String>,
    pub source_document_id: String,
}

/// Terminal artifact of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimAnalysis {
    pub claim_id: String,
    pub claim_type: ClaimType,
    pub conditions: Vec<MedicalCondition>,
    pub timeline: Vec<TimelineEntry>,
    /// In `[0, 1]`.
    pub evidence_strength: f32,
    pub missing_evidence: Vec<String>,
    pub recommendations: Vec<String>,
    pub dbq_needed: Vec<String>,
    pub presumptive_conditions: Vec<String>,
    /// In `[0, 0.95]`.
    pub confidence_score: f32,
    pub processing_time_seconds: f64,
}

impl ClaimAnalysis {
    pub fn condition(&self, name: &str) -> Option<&MedicalCondition> {
        self.conditions.iter().find(|c| c.name == name)
    }
}

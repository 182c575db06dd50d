use serde::{Deserialize, Serialize};

use super::ReportError;
use crate::models::{ClaimAnalysis, ClaimType};

pub const EXAM_TYPE: &str = "Compensation & Pension";
const TIMELINE_DATES: usize = 5;

const PTSD_INSTRUCTIONS: &[&str] = &[
    "Please assess PTSD symptoms using DSM-5 criteria and complete PTSD DBQ",
    "Document any reported stressors and assess credibility",
];
const NEXUS_INSTRUCTION: &str = "Please provide nexus opinion based on review of evidence and examination";
const DIAGNOSIS_INSTRUCTION: &str = "Please provide current diagnosis with appropriate ICD-10 coding";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamCondition {
    pub name: String,
    pub icd10_codes: Vec<String>,
    pub evidence_count: usize,
    pub has_nexus: bool,
    pub has_in_service_event: bool,
    pub severity_estimate: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEvidenceSummary {
    pub condition: String,
    /// Text of the condition's first evidence item.
    pub strongest_evidence: Option<String>,
    /// ISO dates of up to five continuity items.
    pub timeline: Vec<String>,
}

/// Examination request for contract clinicians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRequest {
    pub claim_id: String,
    pub exam_type: String,
    pub conditions: Vec<ExamCondition>,
    pub dbqs_required: Vec<String>,
    pub special_instructions: Vec<String>,
    pub evidence_summary: Vec<ConditionEvidenceSummary>,
    pub opinions_needed: Vec<String>,
}

impl ExamRequest {
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn build_exam_request(analysis: &ClaimAnalysis) -> ExamRequest {
    let conditions = analysis
        .conditions
        .iter()
        .map(|c| ExamCondition {
            name: c.name.clone(),
            icd10_codes: c.icd10_codes.clone(),
            evidence_count: c.evidence_items.len(),
            has_nexus: c.nexus_statement.is_some(),
            has_in_service_event: c.in_service_event.is_some(),
            severity_estimate: c.severity_rating,
        })
        .collect();

    let evidence_summary = analysis
        .conditions
        .iter()
        .map(|c| ConditionEvidenceSummary {
            condition: c.name.clone(),
            strongest_evidence: c.evidence_items.first().map(|e| e.text.clone()),
            timeline: c
                .continuity_evidence
                .iter()
                .take(TIMELINE_DATES)
                .map(|e| e.date.map_or_else(|| "undated".to_string(), |d| d.to_string()))
                .collect(),
        })
        .collect();

    let opinions_needed = analysis
        .conditions
        .iter()
        .filter(|c| c.nexus_statement.is_none())
        .map(|c| {
            format!(
                "Medical opinion on whether {} is at least as likely as not related to military service",
                c.name
            )
        })
        .collect();

    ExamRequest {
        claim_id: analysis.claim_id.clone(),
        exam_type: EXAM_TYPE.to_string(),
        conditions,
        dbqs_required: analysis.dbq_needed.clone(),
        special_instructions: special_instructions(analysis),
        evidence_summary,
        opinions_needed,
    }
}

fn special_instructions(analysis: &ClaimAnalysis) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        if !out.iter().any(|existing| existing == s) {
            out.push(s.to_string());
        }
    };

    if analysis.claim_type == ClaimType::Ptsd {
        PTSD_INSTRUCTIONS.iter().for_each(|s| push(s));
    }
    for gap in &analysis.missing_evidence {
        let lower = gap.to_lowercase();
        if lower.contains("nexus") {
            push(NEXUS_INSTRUCTION);
        } else if lower.contains("diagnosis") {
            push(DIAGNOSIS_INSTRUCTION);
        }
    }
    out
}

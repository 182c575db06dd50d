//! Regex hints scanned out of full document text.
//!
//! Nothing here is authoritative. Identifier numbers are reduced to their last
//! four digits before they leave this module.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::DocumentMetadata;

const MAX_DATES: usize = 10;
const MAX_NAME_CANDIDATES: usize = 5;

/// Condition keywords recognized in claim paperwork, lower-case.
pub const MEDICAL_KEYWORDS: &[&str] = &[
    "ptsd",
    "tbi",
    "traumatic brain injury",
    "depression",
    "anxiety",
    "hearing loss",
    "tinnitus",
    "back pain",
    "knee pain",
    "sleep apnea",
    "diabetes",
    "hypertension",
    "ischemic heart disease",
    "peripheral neuropathy",
    "radiculopathy",
    "degenerative disc disease",
    "arthritis",
    "migraines",
    "gerd",
    "ibs",
    "chronic fatigue",
    "fibromyalgia",
    "sciatica",
];

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})\b").unwrap()
});
static SSN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-(\d{4})\b").unwrap());
static PERSON_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([A-Z][a-z]+ [A-Z][a-z]+)\b").unwrap());
static MILITARY_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,3}(?:st|nd|rd|th)\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?\b").unwrap()
});
static ICD10: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]\d{2}(?:\.\d{1,2})?\b").unwrap());

pub fn extract_metadata(text: &str) -> DocumentMetadata {
    let dates = DATE
        .find_iter(text)
        .take(MAX_DATES)
        .map(|m| m.as_str().to_string())
        .collect();

    let ssn_masked: Vec<String> = SSN
        .captures_iter(text)
        .map(|c| format!("XXX-XX-{}", &c[1]))
        .collect();

    let possible_names = unique(
        PERSON_NAME
            .find_iter(text)
            .take(MAX_NAME_CANDIDATES)
            .map(|m| m.as_str().to_string()),
    );

    let military_units = unique(MILITARY_UNIT.find_iter(text).map(|m| m.as_str().to_string()));

    DocumentMetadata {
        dates,
        ssn_detected: !ssn_masked.is_empty(),
        ssn_masked,
        possible_names,
        medical_terms: extract_medical_terms(text),
        military_units,
    }
}

/// Keyword hits (lower-case) followed by ICD-10-shaped codes, de-duplicated.
pub fn extract_medical_terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let keywords = MEDICAL_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| k.to_string());
    unique(keywords.chain(extract_icd_codes(text)))
}

/// ICD-10-shaped codes in order of appearance, de-duplicated.
pub fn extract_icd_codes(text: &str) -> Vec<String> {
    unique(ICD10.find_iter(text).map(|m| m.as_str().to_string()))
}

fn unique(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|i| seen.insert(i.clone())).collect()
}

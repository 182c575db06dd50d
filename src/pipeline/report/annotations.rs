use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ReportError;
use crate::models::{ClaimAnalysis, Relevance};

/// Tab colours, indexed by a stable hash of the condition name.
pub const TAB_PALETTE: [&str; 8] = ["red", "blue", "green", "orange", "purple", "cyan", "magenta", "brown"];

const BOOKMARK_NOTE_CHARS: usize = 100;
const SUMMARY_MAX_GAPS: usize = 5;
const SUMMARY_MAX_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub document_id: String,
    pub page_number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionTab {
    pub name: String,
    /// Pages holding this condition's evidence, first-seen order, no repeats.
    pub pages: Vec<PageRef>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub document_id: String,
    pub page: usize,
    pub title: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightAnnotation {
    pub document_id: String,
    pub page: usize,
    /// Byte offsets into the evidence text.
    pub start: usize,
    pub end: usize,
    pub color: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationBundle {
    pub tabs: Vec<ConditionTab>,
    pub bookmarks: Vec<Bookmark>,
    pub highlights: Vec<HighlightAnnotation>,
    pub summary: String,
}

impl AnnotationBundle {
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Palette entry for a condition: first 8 bytes of SHA-256 over the name,
/// big-endian, modulo the palette size.
pub fn condition_color(name: &str) -> &'static str {
    let digest = Sha256::digest(name.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    TAB_PALETTE[(u64::from_be_bytes(head) % TAB_PALETTE.len() as u64) as usize]
}

pub fn build_annotations(analysis: &ClaimAnalysis) -> AnnotationBundle {
    let tabs = analysis
        .conditions
        .iter()
        .map(|c| {
            let mut pages: Vec<PageRef> = Vec::new();
            for e in &c.evidence_items {
                let page = PageRef {
                    document_id: e.document_id.clone(),
                    page_number: e.page_number,
                };
                if !pages.contains(&page) {
                    pages.push(page);
                }
            }
            ConditionTab {
                name: c.name.clone(),
                pages,
                color: condition_color(&c.name).to_string(),
            }
        })
        .collect();

    let bookmarks = analysis
        .conditions
        .iter()
        .flat_map(|c| {
            c.evidence_items
                .iter()
                .filter(|e| e.relevance == Relevance::Direct)
                .map(move |e| Bookmark {
                    document_id: e.document_id.clone(),
                    page: e.page_number,
                    title: format!("{} - {}", c.name, e.evidence_type),
                    note: e.text.chars().take(BOOKMARK_NOTE_CHARS).collect(),
                })
        })
        .collect();

    let highlights = analysis
        .conditions
        .iter()
        .flat_map(|c| c.evidence_items.iter().map(move |e| (c, e)))
        .flat_map(|(c, e)| {
            let color = if e.relevance == Relevance::Direct { "yellow" } else { "blue" };
            e.highlights.iter().map(move |&(start, end)| HighlightAnnotation {
                document_id: e.document_id.clone(),
                page: e.page_number,
                start,
                end,
                color: color.to_string(),
                note: c.name.clone(),
            })
        })
        .collect();

    AnnotationBundle {
        tabs,
        bookmarks,
        highlights,
        summary: executive_summary(analysis),
    }
}

fn percent(value: f32) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Plain-text overview of the analysis.
pub fn executive_summary(analysis: &ClaimAnalysis) -> String {
    let mut out = String::from("Claim Analysis Summary\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');
    out.push_str(&format!("Claim Type: {}\n", analysis.claim_type));
    out.push_str(&format!("Conditions Claimed: {}\n", analysis.conditions.len()));
    out.push_str(&format!("Evidence Strength: {}\n", percent(analysis.evidence_strength)));
    out.push_str(&format!("Confidence Score: {}\n\n", percent(analysis.confidence_score)));

    out.push_str("Conditions:\n");
    for c in &analysis.conditions {
        out.push_str(&format!("- {}: {} evidence items\n", c.name, c.evidence_items.len()));
    }

    if !analysis.missing_evidence.is_empty() {
        out.push_str("\nMissing Evidence:\n");
        for gap in analysis.missing_evidence.iter().take(SUMMARY_MAX_GAPS) {
            out.push_str(&format!("- {gap}\n"));
        }
    }

    if !analysis.recommendations.is_empty() {
        out.push_str("\nTop Recommendations:\n");
        for rec in analysis.recommendations.iter().take(SUMMARY_MAX_RECOMMENDATIONS) {
            out.push_str(&format!("- {rec}\n"));
        }
    }

    out
}

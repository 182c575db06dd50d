use super::evidence::truncate_chars;
use crate::models::{Evidence, TimelineEntry};

/// Dated evidence in ascending date order. Equal dates keep extraction order.
pub fn build_timeline(evidence: &[Evidence], max_text_chars: usize) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = evidence
        .iter()
        .filter_map(|e| {
            Some(TimelineEntry {
                date: e.date?,
                event_text: truncate_chars(&e.text, max_text_chars).to_string(),
                evidence_type: e.evidence_type,
                condition: e.condition.clone(),
                source_document_id: e.document_id.clone(),
            })
        })
        .collect();
    entries.sort_by_key(|t| t.date);
    entries
}

//! Builders shared by analysis tests.

use chrono::{NaiveDate, Utc};

use crate::models::{
    Document, DocumentFormat, DocumentMetadata, DocumentType, Evidence, EvidenceType, MedicalCondition, Page,
    ProcessingStatus, Relevance,
};

pub fn document(id: &str, classified_type: DocumentType, pages: Vec<Page>) -> Document {
    let full_text = pages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("\n");
    Document {
        id: id.to_string(),
        filename: format!("{id}.txt"),
        format: DocumentFormat::PlainText,
        pages,
        full_text,
        classified_type,
        metadata: DocumentMetadata::default(),
        tables: Vec::new(),
        has_images: false,
        needed_ocr: false,
        status: ProcessingStatus::Completed,
        processed_at: Utc::now(),
    }
}

pub fn text_document(id: &str, classified_type: DocumentType, text: &str) -> Document {
    document(id, classified_type, vec![Page::text(1, text)])
}

pub fn evidence(condition: &str, evidence_type: EvidenceType, text: &str) -> Evidence {
    Evidence {
        document_id: "doc".into(),
        page_number: 1,
        text: text.into(),
        evidence_type,
        relevance: Relevance::Direct,
        confidence: 0.8,
        condition: Some(condition.into()),
        date: None,
        provider: None,
        diagnosis_codes: vec![],
        highlights: vec![],
    }
}

pub fn dated(mut e: Evidence, y: i32, m: u32, d: u32) -> Evidence {
    e.date = NaiveDate::from_ymd_opt(y, m, d);
    e
}

pub fn condition(name: &str, evidence_items: Vec<Evidence>) -> MedicalCondition {
    MedicalCondition {
        name: name.into(),
        icd10_codes: vec![],
        evidence_items,
        in_service_event: None,
        nexus_statement: None,
        continuity_evidence: vec![],
        severity_rating: None,
        secondary_to: None,
    }
}

//! End-to-end claim processing: ingest every file, analyze, then build the
//! annotation bundle and exam request.
//!
//! Capabilities are injected through the ingestor and analyzer so the whole
//! chain runs against fakes in tests.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{ClaimAnalysis, Document, ProcessingStatus};
use crate::pipeline::analysis::{AnalysisError, ClaimAnalyzer};
use crate::pipeline::ingestion::{DocumentIngestor, ExtractionError};
use crate::pipeline::report::{build_annotations, build_exam_request, AnnotationBundle, ExamRequest};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Extraction failed for {filename}: {source}")]
    Extraction {
        filename: String,
        #[source]
        source: ExtractionError,
    },

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Claim queue error: {0}")]
    Queue(String),

    #[error("Claim {claim_id} cannot move from {from} to {to}")]
    InvalidTransition {
        claim_id: String,
        from: ProcessingStatus,
        to: ProcessingStatus,
    },
}

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// One claim submission: raw files plus the conditions being claimed.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub claim_id: String,
    /// `(filename, bytes)` pairs.
    pub files: Vec<(String, Vec<u8>)>,
    /// May be empty; conditions are then read off the application form.
    pub claimed_conditions: Vec<String>,
}

impl ClaimRequest {
    pub fn new(files: Vec<(String, Vec<u8>)>, claimed_conditions: Vec<String>) -> Self {
        Self {
            claim_id: Uuid::new_v4().to_string(),
            files,
            claimed_conditions,
        }
    }
}

/// Everything produced for a successfully processed claim.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimReport {
    pub claim_id: String,
    pub documents: Vec<Document>,
    pub analysis: ClaimAnalysis,
    pub annotations: AnnotationBundle,
    pub exam_request: ExamRequest,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives ingest → analyze → report for a whole claim.
///
/// Any file that fails ingestion fails the claim; no partial report is produced.
pub struct ClaimProcessor {
    ingestor: Arc<DocumentIngestor>,
    analyzer: Arc<ClaimAnalyzer>,
}

impl ClaimProcessor {
    pub fn new(ingestor: Arc<DocumentIngestor>, analyzer: Arc<ClaimAnalyzer>) -> Self {
        Self { ingestor, analyzer }
    }

    pub fn process(&self, request: &ClaimRequest) -> Result<ClaimReport, ProcessingError> {
        tracing::info!(
            claim_id = %request.claim_id,
            files = request.files.len(),
            "Processing: starting ingestion"
        );

        let documents = self
            .ingestor
            .ingest_batch(&request.files)
            .into_iter()
            .zip(&request.files)
            .map(|(result, (filename, _))| {
                result.map_err(|source| ProcessingError::Extraction {
                    filename: filename.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            claim_id = %request.claim_id,
            documents = documents.len(),
            needed_ocr = documents.iter().filter(|d| d.needed_ocr).count(),
            "Processing: starting analysis"
        );

        let analysis = self
            .analyzer
            .analyze(&request.claim_id, &documents, &request.claimed_conditions)?;
        let annotations = build_annotations(&analysis);
        let exam_request = build_exam_request(&analysis);

        tracing::info!(
            claim_id = %request.claim_id,
            conditions = analysis.conditions.len(),
            confidence = analysis.confidence_score,
            "Processing: claim complete"
        );

        Ok(ClaimReport {
            claim_id: request.claim_id.clone(),
            documents,
            analysis,
            annotations,
            exam_request,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::analysis::{RuleEntityExtractor, ScriptedSimilarity, StaticKnowledgeBase};
    use crate::pipeline::ingestion::{MockOcrEngine, PdfTextExtractor};
    use crate::pipeline_config::PipelineConfig;

    pub(crate) fn processor() -> ClaimProcessor {
        let config = PipelineConfig::default();
        let ingestor = DocumentIngestor::new(
            Arc::new(MockOcrEngine::new("")),
            Arc::new(PdfTextExtractor),
            config.ingestion,
        );
        let analyzer = ClaimAnalyzer::new(
            Arc::new(ScriptedSimilarity::new(0.1).rule("tinnitus", "tinnitus", 0.85)),
            Arc::new(RuleEntityExtractor),
            Arc::new(StaticKnowledgeBase::default()),
            config.analysis,
        );
        ClaimProcessor::new(Arc::new(ingestor), Arc::new(analyzer))
    }

    pub(crate) fn tinnitus_request() -> ClaimRequest {
        ClaimRequest::new(
            vec![
                (
                    "dd214.txt".into(),
                    b"DD Form 214. Military occupational specialty: artillery. Tinnitus noted at separation.".to_vec(),
                ),
                (
                    "nexus.txt".into(),
                    b"Medical opinion: the veteran's tinnitus is at least as likely as not caused by noise exposure. Nexus established.".to_vec(),
                ),
            ],
            vec!["tinnitus".into()],
        )
    }

    #[test]
    fn processes_claim_end_to_end() {
        let request = tinnitus_request();
        let report = processor().process(&request).unwrap();

        assert_eq!(report.claim_id, request.claim_id);
        assert_eq!(report.documents.len(), 2);
        let tinnitus = report.analysis.condition("tinnitus").unwrap();
        assert!(tinnitus.in_service_event.is_some());
        assert!(tinnitus.nexus_statement.is_some());
        assert_eq!(report.annotations.tabs.len(), 1);
        assert!(report.exam_request.opinions_needed.is_empty());
        assert!(report.annotations.summary.contains("tinnitus: 2 evidence items"));
    }

    #[test]
    fn one_bad_file_fails_the_claim() {
        let mut request = tinnitus_request();
        request.files.push(("scan.bmp".into(), vec![0u8; 10]));
        let err = processor().process(&request).unwrap_err();
        assert!(matches!(err, ProcessingError::Extraction { ref filename, .. } if filename == "scan.bmp"));
    }

    #[test]
    fn request_ids_are_unique() {
        let a = ClaimRequest::new(vec![], vec![]);
        let b = ClaimRequest::new(vec![], vec![]);
        assert_ne!(a.claim_id, b.claim_id);
    }
}

//! Explicitly constructed pipeline context.
//!
//! `PipelineContext` owns every capability the pipelines need and is passed
//! to the entry points below. Nothing is loaded lazily or held globally:
//! build it once at startup, share it behind an `Arc`, and call
//! [`PipelineContext::shutdown`] when done.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config;
use crate::models::{ClaimAnalysis, Document};
use crate::pipeline::analysis::{
    AnalysisError, ClaimAnalyzer, EntityExtractor, GenerativeAssistant, KnowledgeBase,
    RuleEntityExtractor, SimilarityService,
};
use crate::pipeline::ingestion::{
    DocumentClassifier, DocumentIngestor, ExtractionError, KeywordClassifier, OcrEngine,
    PdfExtractor, PdfPageRenderer, PdfTextExtractor,
};
use crate::pipeline::processor::ClaimProcessor;
use crate::pipeline::queue::ClaimQueue;
use crate::pipeline::report::{AnnotationBundle, ExamRequest};
use crate::pipeline_config::PipelineConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Required capability not configured: {0}")]
    MissingCapability(&'static str),
}

// ═══════════════════════════════════════════════════════════
// Context
// ═══════════════════════════════════════════════════════════

pub struct PipelineContext {
    ocr_engine: Arc<dyn OcrEngine>,
    pdf_extractor: Arc<dyn PdfExtractor>,
    pdf_renderer: Option<Arc<dyn PdfPageRenderer>>,
    classifier: Arc<dyn DocumentClassifier>,
    similarity: Arc<dyn SimilarityService>,
    entities: Arc<dyn EntityExtractor>,
    knowledge: Arc<dyn KnowledgeBase>,
    assistant: Option<Arc<dyn GenerativeAssistant>>,
    config: PipelineConfig,
    ingestor: Arc<DocumentIngestor>,
    analyzer: Arc<ClaimAnalyzer>,
}

/// Which capabilities a context was built with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub ocr_engine: String,
    pub similarity_service: String,
    pub pdf_renderer: bool,
    pub knowledge_base: bool,
    pub generative_assistant: bool,
}

impl PipelineContext {
    pub fn builder() -> PipelineContextBuilder {
        PipelineContextBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ingestor(&self) -> Arc<DocumentIngestor> {
        self.ingestor.clone()
    }

    pub fn analyzer(&self) -> Arc<ClaimAnalyzer> {
        self.analyzer.clone()
    }

    pub fn generative_assistant(&self) -> Option<Arc<dyn GenerativeAssistant>> {
        self.assistant.clone()
    }

    pub fn processor(&self) -> ClaimProcessor {
        ClaimProcessor::new(self.ingestor(), self.analyzer())
    }

    /// Start a claim queue on the current tokio runtime.
    pub fn start_queue(&self, capacity: usize) -> ClaimQueue {
        ClaimQueue::start(Arc::new(self.processor()), capacity)
    }

    pub fn health_check(&self) -> HealthReport {
        tracing::debug!("Health check called");
        HealthReport {
            status: "healthy".to_string(),
            version: config::APP_VERSION.to_string(),
            ocr_engine: self.ocr_engine.name().to_string(),
            similarity_service: self.similarity.name().to_string(),
            pdf_renderer: self.pdf_renderer.is_some(),
            knowledge_base: true,
            generative_assistant: self.assistant.is_some(),
        }
    }

    /// Release capability handles. In-flight work holding its own `Arc`s finishes normally.
    pub fn shutdown(self) {
        tracing::info!(
            ocr_engine = self.ocr_engine.name(),
            similarity_service = self.similarity.name(),
            classifier_refs = Arc::strong_count(&self.classifier),
            pdf_extractor_refs = Arc::strong_count(&self.pdf_extractor),
            entity_extractor_refs = Arc::strong_count(&self.entities),
            knowledge_base_refs = Arc::strong_count(&self.knowledge),
            "Pipeline context shutting down"
        );
    }
}

// ═══════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════

/// OCR engine, similarity service and knowledge base are required. The PDF
/// text extractor, classifier and entity extractor fall back to the
/// built-in rule-based implementations.
#[derive(Default)]
pub struct PipelineContextBuilder {
    ocr_engine: Option<Arc<dyn OcrEngine>>,
    pdf_extractor: Option<Arc<dyn PdfExtractor>>,
    pdf_renderer: Option<Arc<dyn PdfPageRenderer>>,
    classifier: Option<Arc<dyn DocumentClassifier>>,
    similarity: Option<Arc<dyn SimilarityService>>,
    entities: Option<Arc<dyn EntityExtractor>>,
    knowledge: Option<Arc<dyn KnowledgeBase>>,
    assistant: Option<Arc<dyn GenerativeAssistant>>,
    config: PipelineConfig,
}

impl PipelineContextBuilder {
    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    pub fn pdf_extractor(mut self, extractor: Arc<dyn PdfExtractor>) -> Self {
        self.pdf_extractor = Some(extractor);
        self
    }

    pub fn pdf_renderer(mut self, renderer: Arc<dyn PdfPageRenderer>) -> Self {
        self.pdf_renderer = Some(renderer);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn DocumentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn similarity(mut self, service: Arc<dyn SimilarityService>) -> Self {
        self.similarity = Some(service);
        self
    }

    pub fn entity_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.entities = Some(extractor);
        self
    }

    pub fn knowledge_base(mut self, knowledge: Arc<dyn KnowledgeBase>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn generative_assistant(mut self, assistant: Arc<dyn GenerativeAssistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<PipelineContext, ContextError> {
        let ocr_engine = self.ocr_engine.ok_or(ContextError::MissingCapability("ocr_engine"))?;
        let similarity = self
            .similarity
            .ok_or(ContextError::MissingCapability("similarity_service"))?;
        let knowledge = self
            .knowledge
            .ok_or(ContextError::MissingCapability("knowledge_base"))?;
        let pdf_extractor = self
            .pdf_extractor
            .unwrap_or_else(|| Arc::new(PdfTextExtractor));
        let classifier = self.classifier.unwrap_or_else(|| Arc::new(KeywordClassifier));
        let entities = self.entities.unwrap_or_else(|| Arc::new(RuleEntityExtractor));

        let mut ingestor = DocumentIngestor::new(
            ocr_engine.clone(),
            pdf_extractor.clone(),
            self.config.ingestion.clone(),
        )
        .with_classifier(classifier.clone());
        if let Some(renderer) = &self.pdf_renderer {
            ingestor = ingestor.with_pdf_renderer(renderer.clone());
        }
        let analyzer = ClaimAnalyzer::new(
            similarity.clone(),
            entities.clone(),
            knowledge.clone(),
            self.config.analysis.clone(),
        );

        tracing::info!(
            ocr_engine = ocr_engine.name(),
            similarity_service = similarity.name(),
            pdf_renderer = self.pdf_renderer.is_some(),
            generative_assistant = self.assistant.is_some(),
            "Pipeline context ready"
        );

        Ok(PipelineContext {
            ocr_engine,
            pdf_extractor,
            pdf_renderer: self.pdf_renderer,
            classifier,
            similarity,
            entities,
            knowledge,
            assistant: self.assistant,
            config: self.config,
            ingestor: Arc::new(ingestor),
            analyzer: Arc::new(analyzer),
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Entry points
// ═══════════════════════════════════════════════════════════

pub fn run_ingestion(
    ctx: &PipelineContext,
    bytes: &[u8],
    filename: &str,
) -> Result<Document, ExtractionError> {
    ctx.ingestor.ingest(bytes, filename)
}

/// Results are in input order, one per file.
pub fn run_ingestion_batch(
    ctx: &PipelineContext,
    files: &[(String, Vec<u8>)],
) -> Vec<Result<Document, ExtractionError>> {
    ctx.ingestor.ingest_batch(files)
}

pub fn run_analysis(
    ctx: &PipelineContext,
    claim_id: &str,
    documents: &[Document],
    claimed_conditions: &[String],
) -> Result<ClaimAnalysis, AnalysisError> {
    ctx.analyzer.analyze(claim_id, documents, claimed_conditions)
}

pub fn build_annotations(analysis: &ClaimAnalysis) -> AnnotationBundle {
    crate::pipeline::report::build_annotations(analysis)
}

pub fn build_exam_request(analysis: &ClaimAnalysis) -> ExamRequest {
    crate::pipeline::report::build_exam_request(analysis)
}

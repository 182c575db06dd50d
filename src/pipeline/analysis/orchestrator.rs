use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use super::aggregate::aggregate_conditions;
use super::discovery::{claim_type_for, discover_claimed_conditions, normalize_claimed};
use super::evidence::EvidenceExtractor;
use super::gaps::{generate_recommendations, identify_gaps};
use super::presumptive::{presumptive_conditions, ServiceHistory};
use super::relevance::ConditionIndex;
use super::scoring::{confidence_score, evidence_strength};
use super::timeline::build_timeline;
use super::types::{EntityExtractor, KnowledgeBase, SimilarityService};
use super::AnalysisError;
use crate::models::{ClaimAnalysis, Document, Evidence, MedicalCondition};
use crate::pipeline_config::AnalysisConfig;

/// Runs evidence analysis for one claim at a time.
pub struct ClaimAnalyzer {
    similarity: Arc<dyn SimilarityService>,
    entities: Arc<dyn EntityExtractor>,
    knowledge: Arc<dyn KnowledgeBase>,
    config: AnalysisConfig,
}

impl ClaimAnalyzer {
    pub fn new(
        similarity: Arc<dyn SimilarityService>,
        entities: Arc<dyn EntityExtractor>,
        knowledge: Arc<dyn KnowledgeBase>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            similarity,
            entities,
            knowledge,
            config,
        }
    }

    /// Analyze `documents` against `claimed_conditions`.
    ///
    /// An empty condition list means the conditions are read off any
    /// application forms among the documents.
    pub fn analyze(
        &self,
        claim_id: &str,
        documents: &[Document],
        claimed_conditions: &[String],
    ) -> Result<ClaimAnalysis, AnalysisError> {
        let started = Instant::now();
        if documents.is_empty() {
            return Err(AnalysisError::NoDocuments(claim_id.to_string()));
        }

        let claimed = if claimed_conditions.is_empty() {
            discover_claimed_conditions(documents, self.entities.as_ref())?
        } else {
            normalize_claimed(claimed_conditions)
        };

        info!(
            claim_id = %claim_id,
            documents = documents.len(),
            conditions = claimed.len(),
            "Starting claim analysis"
        );

        let evidence = self.extract_evidence(documents, &claimed)?;
        let conditions = aggregate_conditions(&evidence, &claimed);
        let timeline = build_timeline(&evidence, self.config.timeline_text_max_chars);

        let strength = evidence_strength(&conditions);
        let missing_evidence = identify_gaps(&conditions, &claimed);
        let recommendations = generate_recommendations(
            &conditions,
            &missing_evidence,
            self.knowledge.as_ref(),
            self.config.weak_evidence_threshold,
        );
        let dbq_needed = self.dbqs_needed(&conditions);
        let presumptive = presumptive_conditions(
            ServiceHistory::from_documents(documents),
            &conditions,
            self.knowledge.as_ref(),
        );
        let confidence = confidence_score(&conditions, strength, self.config.confidence_cap);
        let processing_time_seconds = started.elapsed().as_secs_f64();

        info!(
            claim_id = %claim_id,
            evidence = evidence.len(),
            matched_conditions = conditions.len(),
            gaps = missing_evidence.len(),
            strength,
            confidence,
            elapsed_secs = processing_time_seconds,
            "Claim analysis complete"
        );

        Ok(ClaimAnalysis {
            claim_id: claim_id.to_string(),
            claim_type: claim_type_for(&claimed),
            conditions,
            timeline,
            evidence_strength: strength,
            missing_evidence,
            recommendations,
            dbq_needed,
            presumptive_conditions: presumptive,
            confidence_score: confidence,
            processing_time_seconds,
        })
    }

    /// Per-document extraction runs in parallel; results keep document order.
    fn extract_evidence(&self, documents: &[Document], claimed: &[String]) -> Result<Vec<Evidence>, AnalysisError> {
        if claimed.is_empty() {
            return Ok(Vec::new());
        }
        let index = ConditionIndex::build(self.similarity.as_ref(), claimed)?;
        let extractor = EvidenceExtractor::new(
            self.similarity.as_ref(),
            self.entities.as_ref(),
            &index,
            &self.config,
        );

        let per_document = documents
            .par_iter()
            .map(|doc| extractor.extract(doc))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(per_document.into_iter().flatten().collect())
    }

    fn dbqs_needed(&self, conditions: &[MedicalCondition]) -> Vec<String> {
        let mut dbqs: Vec<String> = Vec::new();
        for dbq in conditions.iter().filter_map(|c| self.knowledge.dbq_for(&c.name)) {
            if !dbqs.contains(&dbq) {
                dbqs.push(dbq);
            }
        }
        dbqs
    }
}

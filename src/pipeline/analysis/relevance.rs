use tracing::debug;

use super::types::SimilarityService;
use super::AnalysisError;
use crate::models::Relevance;
use crate::pipeline_config::AnalysisConfig;

/// Case-insensitive markers that turn a strong match into contradictory evidence.
pub const CONTRADICTION_MARKERS: &[&str] = &["denied", "no evidence", "not related", "unrelated"];

/// Claimed conditions with their embeddings, computed once per analysis.
pub struct ConditionIndex {
    entries: Vec<(String, Vec<f32>)>,
}

impl ConditionIndex {
    /// Embed each condition. Order is preserved and decides ties.
    pub fn build(similarity: &dyn SimilarityService, conditions: &[String]) -> Result<Self, AnalysisError> {
        let entries = conditions
            .iter()
            .map(|c| -> Result<(String, Vec<f32>), AnalysisError> { Ok((c.clone(), similarity.embed(c)?)) })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Similarity thresholds. Both comparisons are strict.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceThresholds {
    pub direct: f32,
    pub supporting: f32,
}

impl From<&AnalysisConfig> for RelevanceThresholds {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            direct: config.direct_threshold,
            supporting: config.supporting_threshold,
        }
    }
}

impl Default for RelevanceThresholds {
    fn default() -> Self {
        (&AnalysisConfig::default()).into()
    }
}

/// Best-matching condition for a fragment and the resulting relevance.
///
/// Neutral fragments carry no condition even when one scored highest.
pub fn classify_relevance(
    similarity: &dyn SimilarityService,
    index: &ConditionIndex,
    fragment: &str,
    thresholds: RelevanceThresholds,
) -> Result<(Relevance, Option<String>), AnalysisError> {
    if index.is_empty() {
        return Ok((Relevance::Neutral, None));
    }

    let fragment_vec = similarity.embed(fragment)?;
    let mut best: Option<&str> = None;
    let mut best_score = 0.0f32;
    for (name, vec) in &index.entries {
        let score = similarity.similarity(&fragment_vec, vec);
        if score > best_score {
            best_score = score;
            best = Some(name.as_str());
        }
    }

    let relevance = relevance_for_score(best_score, fragment, thresholds);
    debug!(score = best_score, relevance = relevance.as_str(), "Fragment scored");

    match relevance {
        Relevance::Neutral => Ok((relevance, None)),
        _ => Ok((relevance, best.map(str::to_string))),
    }
}

/// Threshold policy applied to the best similarity score.
pub fn relevance_for_score(score: f32, fragment: &str, thresholds: RelevanceThresholds) -> Relevance {
    if score > thresholds.direct {
        let lower = fragment.to_lowercase();
        if CONTRADICTION_MARKERS.iter().any(|m| lower.contains(m)) {
            Relevance::Contradictory
        } else {
            Relevance::Direct
        }
    } else if score > thresholds.supporting {
        Relevance::Supporting
    } else {
        Relevance::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::embedder::ScriptedSimilarity;

    fn conditions(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn classify(service: &ScriptedSimilarity, names: &[&str], fragment: &str) -> (Relevance, Option<String>) {
        let index = ConditionIndex::build(service, &conditions(names)).unwrap();
        classify_relevance(service, &index, fragment, RelevanceThresholds::default()).unwrap()
    }

    #[test]
    fn strong_match_is_direct() {
        let service = ScriptedSimilarity::new(0.1).rule("combat trauma", "ptsd", 0.85);
        let (rel, cond) = classify(
            &service,
            &["tinnitus", "ptsd"],
            "Patient diagnosed with PTSD due to combat trauma in service",
        );
        assert_eq!(rel, Relevance::Direct);
        assert_eq!(cond.as_deref(), Some("ptsd"));
    }

    #[test]
    fn strong_match_with_denial_is_contradictory() {
        let service = ScriptedSimilarity::new(0.1).rule("knee", "knee pain", 0.9);
        let (rel, cond) = classify(&service, &["knee pain"], "Knee condition is UNRELATED to service");
        assert_eq!(rel, Relevance::Contradictory);
        assert_eq!(cond.as_deref(), Some("knee pain"));
    }

    #[test]
    fn middling_match_is_supporting() {
        let service = ScriptedSimilarity::new(0.1).rule("ears", "tinnitus", 0.5);
        let (rel, cond) = classify(&service, &["tinnitus"], "Complains of ringing ears since deployment");
        assert_eq!(rel, Relevance::Supporting);
        assert_eq!(cond.as_deref(), Some("tinnitus"));
    }

    #[test]
    fn weak_match_is_neutral_without_condition() {
        let service = ScriptedSimilarity::new(0.3);
        let (rel, cond) = classify(&service, &["tinnitus", "ptsd"], "Dental cleaning performed without issue");
        assert_eq!(rel, Relevance::Neutral);
        assert_eq!(cond, None);
    }

    #[test]
    fn thresholds_are_strict() {
        let t = RelevanceThresholds::default();
        assert_eq!(relevance_for_score(0.7, "text", t), Relevance::Supporting);
        assert_eq!(relevance_for_score(0.4, "text", t), Relevance::Neutral);
        assert_eq!(relevance_for_score(0.71, "no evidence of injury", t), Relevance::Contradictory);
    }

    #[test]
    fn ties_go_to_first_supplied_condition() {
        let service = ScriptedSimilarity::new(0.0)
            .rule("ringing", "tinnitus", 0.8)
            .rule("ringing", "hearing loss", 0.8);
        let (_, cond) = classify(&service, &["hearing loss", "tinnitus"], "ringing after blast exposure");
        assert_eq!(cond.as_deref(), Some("hearing loss"));
    }

    #[test]
    fn no_conditions_is_neutral() {
        let service = ScriptedSimilarity::new(0.99);
        assert_eq!(classify(&service, &[], "anything at all here"), (Relevance::Neutral, None));
    }
}

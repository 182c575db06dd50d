use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// Semantic similarity between free text and claimed-condition names.
pub trait SimilarityService: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, AnalysisError>;

    /// Cosine similarity in `[-1, 1]`.
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }

    fn name(&self) -> &'static str {
        "similarity"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Condition,
    Date,
    Person,
    Org,
    VaForm,
    MilitaryUnit,
}

/// A labelled span of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub label: EntityLabel,
    pub text: String,
}

impl Entity {
    pub fn new(label: EntityLabel, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

/// Named-entity extraction over a fragment of text.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<Entity>, AnalysisError>;
}

/// Reference data about conditions and presumptive programs.
///
/// Names passed in are normalized condition names. Presumptive lists are
/// compared against condition names by exact equality.
pub trait KnowledgeBase: Send + Sync {
    fn secondary_conditions_of(&self, condition: &str) -> Vec<String>;
    fn dbq_for(&self, condition: &str) -> Option<String>;
    fn agent_orange_conditions(&self) -> Vec<String>;
    fn gulf_war_conditions(&self) -> Vec<String>;
    fn pact_act_conditions(&self) -> Vec<String>;
}

/// Free-text generation backend. Reserved for narrative output; no analysis
/// stage calls it.
pub trait GenerativeAssistant: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, AnalysisError>;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

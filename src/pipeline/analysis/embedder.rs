use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::SimilarityService;
use super::AnalysisError;
use crate::config::{ollama_base_url, DEFAULT_EMBEDDING_MODEL};

/// Embedding client for a local Ollama instance.
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Similarity(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    /// `OLLAMA_HOST` (or localhost) with the default embedding model.
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::new(&ollama_base_url(), DEFAULT_EMBEDDING_MODEL, 60)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SimilarityService for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, AnalysisError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                AnalysisError::Similarity(format!("Cannot reach Ollama at {}", self.base_url))
            } else if e.is_timeout() {
                AnalysisError::Similarity(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                AnalysisError::Similarity(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::Similarity(format!(
                "Ollama returned {}: {body}",
                status.as_u16()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| AnalysisError::Similarity(format!("Bad embedding response: {e}")))?;

        if parsed.embedding.is_empty() {
            return Err(AnalysisError::Similarity(format!(
                "Model {} returned an empty embedding",
                self.model
            )));
        }
        Ok(parsed.embedding)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// Deterministic similarity for tests and offline runs.
///
/// Each embedded text is remembered and represented by its index. Scores come
/// from rules `(fragment marker, condition, score)`: the first rule whose marker
/// occurs (case-insensitively) in the fragment and whose condition equals the
/// other text wins. Anything else scores `default_score`.
pub struct ScriptedSimilarity {
    rules: Vec<(String, String, f32)>,
    default_score: f32,
    seen: Mutex<Vec<String>>,
}

impl ScriptedSimilarity {
    pub fn new(default_score: f32) -> Self {
        Self {
            rules: Vec::new(),
            default_score,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn rule(mut self, fragment_marker: &str, condition: &str, score: f32) -> Self {
        self.rules
            .push((fragment_marker.to_lowercase(), condition.to_string(), score));
        self
    }

    fn text_of(&self, v: &[f32]) -> Option<String> {
        let idx = *v.first()? as usize;
        self.seen.lock().ok()?.get(idx).cloned()
    }

    fn score(&self, fragment: &str, condition: &str) -> Option<f32> {
        let fragment = fragment.to_lowercase();
        self.rules
            .iter()
            .find(|(marker, cond, _)| cond == condition && fragment.contains(marker.as_str()))
            .map(|(_, _, s)| *s)
    }
}

impl SimilarityService for ScriptedSimilarity {
    fn embed(&self, text: &str) -> Result<Vec<f32>, AnalysisError> {
        let mut seen = self
            .seen
            .lock()
            .map_err(|_| AnalysisError::Similarity("scripted table poisoned".into()))?;
        seen.push(text.to_string());
        Ok(vec![(seen.len() - 1) as f32])
    }

    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        let (Some(a), Some(b)) = (self.text_of(a), self.text_of(b)) else {
            return self.default_score;
        };
        self.score(&a, &b)
            .or_else(|| self.score(&b, &a))
            .unwrap_or(self.default_score)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

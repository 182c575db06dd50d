//! Tunable thresholds for ingestion and evidence analysis.
//!
//! Defaults are the standard pipeline constants. A JSON file may override
//! any subset of fields; missing fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ingestion: IngestionConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// A PDF page with fewer non-whitespace characters is treated as scanned.
    pub min_page_text_chars: usize,
    /// Render resolution for per-page OCR fallback (2x the 72pt page size).
    pub scanned_page_render_dpi: u32,
    /// Render resolution when the whole PDF has to be OCR'd.
    pub fallback_render_dpi: u32,
    /// Synthetic page size for word-processor documents, in characters.
    pub docx_page_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fragments shorter than this (trimmed) are noise.
    pub min_fragment_chars: usize,
    pub evidence_text_max_chars: usize,
    pub timeline_text_max_chars: usize,
    /// Similarity strictly above this is direct (or contradictory) evidence.
    pub direct_threshold: f32,
    /// Similarity strictly above this (and not direct) is supporting evidence.
    pub supporting_threshold: f32,
    /// Conditions whose mean evidence confidence falls below this get a
    /// "strengthen evidence" recommendation.
    pub weak_evidence_threshold: f32,
    /// Overall confidence never exceeds this.
    pub confidence_cap: f32,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            min_page_text_chars: 50,
            scanned_page_render_dpi: 144,
            fallback_render_dpi: 300,
            docx_page_chars: 3000,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_fragment_chars: 20,
            evidence_text_max_chars: 500,
            timeline_text_max_chars: 200,
            direct_threshold: 0.7,
            supporting_threshold: 0.4,
            weak_evidence_threshold: 0.5,
            confidence_cap: 0.95,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

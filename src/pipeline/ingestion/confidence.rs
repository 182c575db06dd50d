use std::sync::LazyLock;

use regex::Regex;

/// Lowest score ever reported for OCR output.
pub const MIN_OCR_CONFIDENCE: f32 = 0.1;

/// Penalty weights for the OCR quality heuristic.
pub mod penalties {
    /// Too many symbols relative to text length.
    pub const SPECIAL_CHARS: f32 = 0.3;
    pub const SPECIAL_CHAR_RATIO: f32 = 0.2;

    /// Average word length outside the plausible range.
    pub const WORD_LENGTH: f32 = 0.2;
    pub const MIN_AVG_WORD_LEN: f32 = 2.0;
    pub const MAX_AVG_WORD_LEN: f32 = 15.0;

    /// No word of three or more letters anywhere.
    pub const NO_WORDS: f32 = 0.3;
}

static WORD_OF_THREE_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z]{3,}\b").unwrap());

/// Heuristic reliability score for raw OCR output, always in `[0.1, 1.0]`.
///
/// A cheap proxy for downstream discounting of garbled pages, not a
/// correctness guarantee.
pub fn score_ocr_text(text: &str) -> f32 {
    let mut score = 1.0f32;

    let total_chars = text.chars().count().max(1);
    let special = text
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '.' || *c == ','))
        .count();
    if special as f32 / total_chars as f32 > penalties::SPECIAL_CHAR_RATIO {
        score -= penalties::SPECIAL_CHARS;
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if !words.is_empty() {
        let letters: usize = words.iter().map(|w| w.chars().count()).sum();
        let avg = letters as f32 / words.len() as f32;
        if avg < penalties::MIN_AVG_WORD_LEN || avg > penalties::MAX_AVG_WORD_LEN {
            score -= penalties::WORD_LENGTH;
        }
    }

    if !WORD_OF_THREE_LETTERS.is_match(text) {
        score -= penalties::NO_WORDS;
    }

    score.max(MIN_OCR_CONFIDENCE)
}

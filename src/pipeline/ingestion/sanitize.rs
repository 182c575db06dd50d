use std::sync::LazyLock;

use regex::Regex;

static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t\r\f\v]*\n\s*").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static OCR_ARTIFACTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,;:!?\-()\[\]{}/@#$%&*+=]").unwrap());

/// Known OCR confusions. Recorded for reference only: applying them needs
/// context rules that do not exist yet, so [`clean_ocr_text`] leaves them alone.
pub const OCR_CONFUSIONS: &[(&str, &str)] = &[("l)", "b"), ("()", "O"), ("|", "I"), ("0", "O")];

/// Normalize raw OCR output.
///
/// Whitespace inside a paragraph collapses to single spaces, characters that are
/// almost always scan artifacts are dropped, and paragraph breaks survive as a
/// single blank line so evidence segmentation still has boundaries to split on.
pub fn clean_ocr_text(raw: &str) -> String {
    PARAGRAPH_BREAK
        .split(raw)
        .map(|para| {
            let collapsed = WHITESPACE_RUN.replace_all(para, " ");
            OCR_ARTIFACTS.replace_all(&collapsed, "").trim().to_string()
        })
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Decode bytes as UTF-8, silently dropping invalid sequences.
pub fn decode_permissive(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_within_paragraph() {
        assert_eq!(clean_ocr_text("  Service   connected\tclaim \n for tinnitus "), "Service connected claim for tinnitus");
    }

    #[test]
    fn keeps_paragraph_breaks() {
        let raw = "First paragraph\nwraps here.\n\n\n   Second paragraph.";
        assert_eq!(clean_ocr_text(raw), "First paragraph wraps here.\n\nSecond paragraph.");
    }

    #[test]
    fn strips_scan_artifacts() {
        assert_eq!(clean_ocr_text("Dx: PTSD ~ | «F43.10»"), "Dx: PTSD   F43.10");
    }

    #[test]
    fn preserves_allowed_punctuation() {
        let raw = "BP 120/80 (normal); ref #12 @ VA + 5% = ok! [a] {b} & *c*?";
        assert_eq!(clean_ocr_text(raw), raw);
    }

    #[test]
    fn confusion_table_is_not_applied() {
        assert_eq!(clean_ocr_text("R0OM 10"), "R0OM 10");
        assert!(OCR_CONFUSIONS.iter().any(|(from, _)| *from == "0"));
    }

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(clean_ocr_text(""), "");
        assert_eq!(clean_ocr_text(" \n\n \t"), "");
    }

    #[test]
    fn permissive_decode_drops_invalid_bytes() {
        let bytes = b"Tinnitus \xff\xfeclaim";
        assert_eq!(decode_permissive(bytes), "Tinnitus claim");
    }
}

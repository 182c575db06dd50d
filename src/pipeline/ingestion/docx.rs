use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::DocumentTable;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

static TABLE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<w:tbl[ >]|</w:tbl>").unwrap());
/// A self-closing `<w:p .../>` (an empty line in Word) or an open/close pair
/// whose body is capture 1.
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*?)?/>|<w:p(?:\s[^>]*)?>(.*?)</w:p>").unwrap()
});
static PARAGRAPH_PROPS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<w:pPr>.*?</w:pPr>").unwrap());
static RUN_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab\s*/>|<w:(?:br|cr)\b[^>]*/>").unwrap()
});
static ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<w:tr(?:\s[^>]*)?>(.*?)</w:tr>").unwrap());
static CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<w:tc(?:\s[^>]*)?>(.*?)</w:tc>").unwrap());
static ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|amp|lt|gt|quot|apos);").unwrap());

/// Content lifted out of a word-processor archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxContent {
    /// Body paragraphs in document order, tables excluded.
    pub paragraphs: Vec<String>,
    pub tables: Vec<DocumentTable>,
    pub has_images: bool,
}

impl DocxContent {
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }
}

/// Read paragraphs, tables and the drawing flag from `.docx` bytes.
pub fn extract_docx(bytes: &[u8]) -> Result<DocxContent, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::DocxParsing(format!("Not a valid archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::DocxParsing(format!("Missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)?;

    let (body, table_xml) = split_tables(&xml);

    let paragraphs = paragraphs_in(&body);

    let tables = table_xml
        .iter()
        .enumerate()
        .map(|(i, t)| DocumentTable {
            table_number: i + 1,
            rows: table_rows(t),
        })
        .collect();

    Ok(DocxContent {
        paragraphs,
        tables,
        has_images: xml.contains("<w:drawing") || xml.contains("<w:pict"),
    })
}

/// Split text into fixed-size pages of `page_chars` characters. Empty text has no pages.
pub fn paginate(text: &str, page_chars: usize) -> Vec<String> {
    let page_chars = page_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(page_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Separate top-level tables from the rest of the body.
fn split_tables(xml: &str) -> (String, Vec<&str>) {
    let mut body = String::with_capacity(xml.len());
    let mut tables = Vec::new();
    let mut depth = 0usize;
    let mut cursor = 0usize;
    let mut table_start = 0usize;

    for m in TABLE_BOUNDARY.find_iter(xml) {
        if m.as_str().starts_with("</") {
            if depth == 0 {
                continue;
            }
            depth -= 1;
            if depth == 0 {
                tables.push(&xml[table_start..m.end()]);
                cursor = m.end();
            }
        } else {
            if depth == 0 {
                body.push_str(&xml[cursor..m.start()]);
                table_start = m.start();
            }
            depth += 1;
        }
    }
    if depth == 0 {
        body.push_str(&xml[cursor..]);
    }

    (body, tables)
}

/// Paragraph texts in order; self-closing paragraphs come back empty.
fn paragraphs_in(xml: &str) -> Vec<String> {
    PARAGRAPH
        .captures_iter(xml)
        .map(|c| c.get(1).map_or_else(String::new, |inner| paragraph_text(inner.as_str())))
        .collect()
}

fn paragraph_text(inner: &str) -> String {
    let inner = PARAGRAPH_PROPS.replace_all(inner, "");
    let mut out = String::new();
    for c in RUN_CONTENT.captures_iter(&inner) {
        match c.get(1) {
            Some(text) => out.push_str(&decode_entities(text.as_str())),
            None if c[0].starts_with("<w:tab") => out.push('\t'),
            None => out.push('\n'),
        }
    }
    out
}

fn table_rows(table: &str) -> Vec<Vec<String>> {
    ROW.captures_iter(table)
        .map(|row| {
            CELL.captures_iter(&row[1])
                .map(|cell| paragraphs_in(&cell[1]).join("\n"))
                .collect()
        })
        .collect()
}

fn decode_entities(s: &str) -> String {
    ENTITY
        .replace_all(s, |c: &regex::Captures| {
            let name = &c[1];
            match name {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => {
                    let code = match name.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => name[1..].parse().ok(),
                    };
                    code.and_then(char::from_u32)
                        .map(String::from)
                        .unwrap_or_default()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{make_docx, para};
    use super::*;

    #[test]
    fn reads_paragraphs_in_order() {
        let body = format!("{}{}{}", para("First"), para("Second"), para("Third"));
        let content = extract_docx(&make_docx(&body)).unwrap();
        assert_eq!(content.paragraphs, vec!["First", "Second", "Third"]);
        assert_eq!(content.text(), "First\nSecond\nThird");
        assert!(content.tables.is_empty());
        assert!(!content.has_images);
    }

    #[test]
    fn joins_runs_and_keeps_empty_paragraphs() {
        let body = "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
                    <w:r><w:t>Lay </w:t></w:r><w:r><w:t>statement</w:t><w:tab/><w:t>x</w:t></w:r></w:p>\
                    <w:p/><w:p></w:p>";
        let content = extract_docx(&make_docx(body)).unwrap();
        assert_eq!(content.paragraphs, vec!["Lay statement\tx", "", ""]);
    }

    #[test]
    fn attributed_empty_paragraph_keeps_blank_line() {
        let body = format!(
            "{}<w:p w:rsidR=\"00A1\" w:rsidRDefault=\"00A1\"/>{}{}",
            para("First"),
            para("Second"),
            para("Third")
        );
        let content = extract_docx(&make_docx(&body)).unwrap();
        assert_eq!(content.paragraphs, vec!["First", "", "Second", "Third"]);
        assert_eq!(content.text(), "First\n\nSecond\nThird");
    }

    #[test]
    fn breaks_become_newlines() {
        let body = "<w:p><w:r><w:t>Alpha</w:t><w:br w:type=\"page\"/><w:t>Beta</w:t>\
                    <w:br/><w:t>Gamma</w:t><w:cr/><w:t>Delta</w:t></w:r></w:p>";
        let content = extract_docx(&make_docx(body)).unwrap();
        assert_eq!(content.paragraphs, vec!["Alpha\nBeta\nGamma\nDelta"]);
    }

    #[test]
    fn blank_paragraphs_survive_into_table_cells() {
        let table = format!(
            "<w:tbl><w:tr><w:tc>{}<w:p w:rsidR=\"01\"/>{}</w:tc></w:tr></w:tbl>",
            para("Top"),
            para("Bottom")
        );
        let content = extract_docx(&make_docx(&table)).unwrap();
        assert_eq!(content.tables[0].rows, vec![vec!["Top\n\nBottom".to_string()]]);
    }

    #[test]
    fn decodes_xml_entities() {
        let content = extract_docx(&make_docx(&para("C&amp;P exam &lt;2019&gt; &#233;"))).unwrap();
        assert_eq!(content.paragraphs, vec!["C&P exam <2019> é"]);
    }

    #[test]
    fn tables_are_grids_and_excluded_from_body() {
        let table = format!(
            "<w:tbl><w:tblPr/><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr><w:tr><w:tc>{}</w:tc><w:tc>{}{}</w:tc></w:tr></w:tbl>",
            para("Date"),
            para("Visit"),
            para("2019-03-01"),
            para("Audiology"),
            para("follow-up"),
        );
        let body = format!("{}{}{}", para("Before"), table, para("After"));
        let content = extract_docx(&make_docx(&body)).unwrap();

        assert_eq!(content.paragraphs, vec!["Before", "After"]);
        assert_eq!(content.tables.len(), 1);
        assert_eq!(content.tables[0].table_number, 1);
        assert_eq!(
            content.tables[0].rows,
            vec![
                vec!["Date".to_string(), "Visit".to_string()],
                vec!["2019-03-01".to_string(), "Audiology\nfollow-up".to_string()],
            ]
        );
    }

    #[test]
    fn drawings_set_image_flag() {
        let body = format!("{}<w:p><w:r><w:drawing><wp:inline/></w:drawing></w:r></w:p>", para("Photo"));
        let content = extract_docx(&make_docx(&body)).unwrap();
        assert!(content.has_images);
    }

    #[test]
    fn invalid_archive_is_docx_error() {
        let err = extract_docx(b"PK not really").unwrap_err();
        assert!(matches!(err, ExtractionError::DocxParsing(_)));
    }

    #[test]
    fn paginate_splits_on_char_count() {
        let text = "é".repeat(7000);
        let pages = paginate(&text, 3000);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].chars().count(), 3000);
        assert_eq!(pages[2].chars().count(), 1000);
        assert!(paginate("", 3000).is_empty());
    }
}

//! Rule-based entity extraction tuned for claim paperwork, plus fuzzy date parsing.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::types::{Entity, EntityExtractor, EntityLabel};
use super::AnalysisError;

const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:\d{{4}}[/-]\d{{1,2}}[/-]\d{{1,2}}|\d{{1,2}}[/-]\d{{1,2}}[/-]\d{{2,4}}|(?:{m})\.?\s+\d{{1,2}},?\s+\d{{4}}|\d{{1,2}}\s+(?:{m})\.?,?\s+\d{{4}}|(?:{m})\.?,?\s+\d{{4}})\b",
        m = MONTHS
    ))
    .unwrap()
});
static PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bDr\.?\s+[A-Z][A-Za-z'-]+(?:\s+[A-Z][A-Za-z'-]+)?|\b[A-Z][a-z]+(?:\s+[A-Z]\.)?\s+[A-Z][A-Za-z'-]+,?\s+(?:MD\b|DO\b|PhD\b|M\.D\.)",
    )
    .unwrap()
});
static ORG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Z][A-Za-z&'-]*\s+){1,5}(?:Clinic|Hospital|Medical Center)\b").unwrap()
});
static VA_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bDD[- ]?214\b|\bVA\s+Form\s+21-526(?:EZ)?\b|\bDBQ\b").unwrap()
});
static MILITARY_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}(?:st|nd|rd|th)\s+\w+").unwrap());
static CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:PTSD|tinnitus|hearing loss|TBI|traumatic brain injury)\b").unwrap()
});

/// Regex entity extractor. Entities come back in text order.
#[derive(Debug, Clone, Default)]
pub struct RuleEntityExtractor;

impl EntityExtractor for RuleEntityExtractor {
    fn extract(&self, text: &str) -> Result<Vec<Entity>, AnalysisError> {
        let rules: [(&Regex, EntityLabel); 6] = [
            (&CONDITION, EntityLabel::Condition),
            (&DATE, EntityLabel::Date),
            (&PERSON, EntityLabel::Person),
            (&ORG, EntityLabel::Org),
            (&VA_FORM, EntityLabel::VaForm),
            (&MILITARY_UNIT, EntityLabel::MilitaryUnit),
        ];

        let mut found: Vec<(usize, Entity)> = rules
            .iter()
            .flat_map(|(re, label)| {
                re.find_iter(text)
                    .map(move |m| (m.start(), Entity::new(*label, m.as_str().trim())))
            })
            .collect();
        found.sort_by_key(|(start, _)| *start);

        Ok(found.into_iter().map(|(_, e)| e).collect())
    }
}

/// Parse a date-like span. Unparseable text yields `None`.
///
/// Numeric dates are month-first unless they lead with a four-digit year.
/// Two-digit years below 69 land in the 2000s. A bare month and year means
/// the first of that month.
pub fn parse_fuzzy_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let parts: Vec<&str> = text.split(['/', '-']).collect();
    if parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
        return parse_numeric(&parts);
    }

    let words = text
        .replace([',', '.'], " ")
        .split_whitespace()
        .map(|w| if w.eq_ignore_ascii_case("sept") { "sep" } else { w })
        .collect::<Vec<_>>()
        .join(" ");

    ["%B %d %Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&words, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("1 {words}"), "%d %B %Y").ok())
}

fn parse_numeric(parts: &[&str]) -> Option<NaiveDate> {
    let nums: Vec<u32> = parts.iter().map(|p| p.parse().ok()).collect::<Option<_>>()?;
    let (year, month, day) = if parts[0].len() == 4 {
        (nums[0] as i32, nums[1], nums[2])
    } else {
        let year = match parts[2].len() {
            2 if nums[2] < 69 => 2000 + nums[2] as i32,
            2 => 1900 + nums[2] as i32,
            4 => nums[2] as i32,
            _ => return None,
        };
        (year, nums[0], nums[1])
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// All parseable DATE entities, ascending.
pub fn sorted_dates(entities: &[Entity]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = entities
        .iter()
        .filter(|e| e.label == EntityLabel::Date)
        .filter_map(|e| parse_fuzzy_date(&e.text))
        .collect();
    dates.sort();
    dates
}

const PROVIDER_TITLES: &[&str] = &["dr", "md", "clinic", "hospital", "medical"];

/// PERSON and ORG entities that look like medical providers, in text order.
pub fn providers(entities: &[Entity]) -> Vec<String> {
    entities
        .iter()
        .filter(|e| matches!(e.label, EntityLabel::Person | EntityLabel::Org))
        .filter(|e| {
            let lower = e.text.to_lowercase();
            PROVIDER_TITLES.iter().any(|t| lower.contains(t))
        })
        .map(|e| e.text.clone())
        .collect()
}

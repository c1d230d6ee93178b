//! Parsing of free-form LLM responses
//!
//! The response format is requested, not guaranteed: models decorate
//! headers, skip sections and phrase price targets differently from run
//! to run. Parsing is therefore a best-effort scan - unrecognized
//! content is ignored, absent sections stay empty, and the target price
//! is extracted through a fixed ladder of rules.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Named sections extracted from a prediction response
///
/// A section the response did not contain is an empty string, never an
/// absent field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSections {
    pub summary: String,
    pub price_analysis: String,
    pub news_impact: String,
    pub sentiment_analysis: String,
    pub prediction: String,
    pub confidence: String,
    pub risk_factors: String,
}

/// Section labels in the order the response format requests them.
/// `CONFIDENCE LEVEL` must be probed before any bare `CONFIDENCE`
/// variant would be.
const SECTION_LABELS: &[(&str, SectionId)] = &[
    ("SUMMARY:", SectionId::Summary),
    ("PRICE ANALYSIS:", SectionId::PriceAnalysis),
    ("NEWS IMPACT:", SectionId::NewsImpact),
    ("SENTIMENT ANALYSIS:", SectionId::SentimentAnalysis),
    ("PREDICTION:", SectionId::Prediction),
    ("CONFIDENCE LEVEL:", SectionId::Confidence),
    ("CONFIDENCE:", SectionId::Confidence),
    ("RISK FACTORS:", SectionId::RiskFactors),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionId {
    Summary,
    PriceAnalysis,
    NewsImpact,
    SentimentAnalysis,
    Prediction,
    Confidence,
    RiskFactors,
}

impl ResponseSections {
    fn field_mut(&mut self, id: SectionId) -> &mut String {
        match id {
            SectionId::Summary => &mut self.summary,
            SectionId::PriceAnalysis => &mut self.price_analysis,
            SectionId::NewsImpact => &mut self.news_impact,
            SectionId::SentimentAnalysis => &mut self.sentiment_analysis,
            SectionId::Prediction => &mut self.prediction,
            SectionId::Confidence => &mut self.confidence,
            SectionId::RiskFactors => &mut self.risk_factors,
        }
    }
}

/// Strip list numbering, markdown decoration and whitespace from the
/// front of a potential header line
fn strip_decoration(line: &str) -> &str {
    line.trim_start_matches(|c: char| {
        c.is_whitespace() || c.is_ascii_digit() || matches!(c, '#' | '*' | '-' | '.' | ')')
    })
}

/// Try to match a section header; returns the section and the text
/// remaining on the header line
fn match_header(line: &str) -> Option<(SectionId, &str)> {
    let stripped = strip_decoration(line);
    let upper = stripped.to_ascii_uppercase();

    for (label, id) in SECTION_LABELS {
        if upper.starts_with(label) {
            let rest = stripped[label.len()..].trim_matches(|c: char| c == '*' || c.is_whitespace());
            return Some((*id, rest));
        }
    }
    None
}

/// Parse an LLM response into its named sections
///
/// Lines that open a recognized section start collecting into it;
/// subsequent non-empty lines append to the current section. Anything
/// before the first recognized header is dropped.
pub fn parse_sections(response: &str) -> ResponseSections {
    let mut sections = ResponseSections::default();
    let mut current: Option<SectionId> = None;

    for line in response.lines() {
        let line = line.trim();

        if let Some((id, rest)) = match_header(line) {
            current = Some(id);
            *sections.field_mut(id) = rest.to_string();
        } else if let Some(id) = current {
            if !line.is_empty() {
                let field = sections.field_mut(id);
                if !field.is_empty() {
                    field.push(' ');
                }
                field.push_str(line);
            }
        }
    }

    sections
}

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\$\s*([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap()
});

static TARGET_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?i)(?:target\s+price|price\s+target)[^0-9$\n]{0,24}\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
        .unwrap()
});

static PREDICTION_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?im)^[\s#*\-0-9.)]*PREDICTION\s*:").unwrap()
});

fn parse_price(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Extract the numeric target price from a prediction response
///
/// Extraction rules, tried in order:
/// 1. the first `$`-prefixed number after a `PREDICTION:` label
/// 2. a number following a `target price` / `price target` label
/// 3. the first `$`-prefixed number anywhere in the text
pub fn extract_target_price(response: &str) -> Option<f64> {
    // Rule 1: first "$" after the prediction label
    if let Some(m) = PREDICTION_LABEL_RE.find(response) {
        if let Some(caps) = CURRENCY_RE.captures(&response[m.end()..]) {
            if let Some(price) = parse_price(&caps[1]) {
                return Some(price);
            }
        }
    }

    // Rule 2: explicitly labeled target price
    if let Some(caps) = TARGET_LABEL_RE.captures(response) {
        if let Some(price) = parse_price(&caps[1]) {
            return Some(price);
        }
    }

    // Rule 3: any currency-formatted number
    CURRENCY_RE
        .captures(response)
        .and_then(|caps| parse_price(&caps[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
SUMMARY: AAPL had a steady week with mild upside.
PRICE ANALYSIS: The stock moved from $198.20 to $202.14,
a gain of about 2%.
NEWS IMPACT: Earnings coverage was broadly positive.
SENTIMENT ANALYSIS: Retail sentiment skews bullish.
PREDICTION: I expect AAPL to close near $203.50 tomorrow.
CONFIDENCE LEVEL: Medium - the range is narrow.
RISK FACTORS: Macro data releases; sector rotation.";

    #[test]
    fn test_parse_all_sections() {
        let sections = parse_sections(SAMPLE);

        assert!(sections.summary.starts_with("AAPL had a steady week"));
        assert_eq!(
            sections.price_analysis,
            "The stock moved from $198.20 to $202.14, a gain of about 2%."
        );
        assert!(sections.prediction.contains("$203.50"));
        assert!(sections.confidence.starts_with("Medium"));
        assert!(sections.risk_factors.contains("sector rotation"));
    }

    #[test]
    fn test_parse_empty_input() {
        let sections = parse_sections("");
        assert_eq!(sections, ResponseSections::default());
        assert!(sections.summary.is_empty());
        assert!(sections.prediction.is_empty());
    }

    #[test]
    fn test_parse_missing_sections_stay_empty() {
        let sections = parse_sections("PREDICTION: flat day ahead.");
        assert_eq!(sections.prediction, "flat day ahead.");
        assert!(sections.summary.is_empty());
        assert!(sections.risk_factors.is_empty());
    }

    #[test]
    fn test_parse_decorated_headers() {
        let text = "\
1. SUMMARY: short week.
**PREDICTION:** about $98.10.
### RISK FACTORS: none noted.";
        let sections = parse_sections(text);
        assert_eq!(sections.summary, "short week.");
        assert!(sections.prediction.contains("$98.10"));
        assert_eq!(sections.risk_factors, "none noted.");
    }

    #[test]
    fn test_parse_lowercase_headers() {
        let sections = parse_sections("Prediction: heading to $12.50");
        assert!(sections.prediction.contains("$12.50"));
    }

    #[test]
    fn test_multiline_section_joins_with_space() {
        let text = "SUMMARY: first line\nsecond line\n\nthird line";
        let sections = parse_sections(text);
        assert_eq!(sections.summary, "first line second line third line");
    }

    #[test]
    fn test_target_price_rule_prediction_label() {
        // The $ after PREDICTION: wins over earlier currency figures
        let price = extract_target_price(SAMPLE);
        assert_eq!(price, Some(203.50));
    }

    #[test]
    fn test_target_price_rule_target_label() {
        let text = "The analyst consensus puts the target price at 415.25 for Q3.";
        assert_eq!(extract_target_price(text), Some(415.25));
    }

    #[test]
    fn test_target_price_rule_first_currency() {
        let text = "Shares traded around $87.60 for most of the session.";
        assert_eq!(extract_target_price(text), Some(87.60));
    }

    #[test]
    fn test_target_price_with_thousands_separator() {
        let text = "PREDICTION: the index should reach $1,234.56 by close.";
        assert_eq!(extract_target_price(text), Some(1234.56));
    }

    #[test]
    fn test_target_price_none_on_empty() {
        assert_eq!(extract_target_price(""), None);
        assert_eq!(extract_target_price("no numbers here"), None);
    }

    #[test]
    fn test_target_price_prediction_beats_target_label() {
        let text = "\
Target price: $100.00 per the street.
PREDICTION: more likely $95.50 tomorrow.";
        assert_eq!(extract_target_price(text), Some(95.50));
    }
}

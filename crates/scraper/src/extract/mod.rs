// ABOUTME: The extraction cascade: folds page-state, linked-data and HTML sources into one record.
// ABOUTME: Each field keeps the first value any source supplies; the heading is mandatory.

//! Field extraction.
//!
//! Three sources are consulted in priority order:
//!
//! 1. [`page_state`]: the JSON blob the page embeds for its own scripts.
//! 2. [`ld_json`]: `application/ld+json` blocks.
//! 3. [`html`]: structural fallbacks over the rendered markup.
//!
//! Every source produces a [`Candidate`]; the candidates are folded together
//! with [`Candidate::or`], so a value from a higher-priority source is never
//! replaced. The name always comes from the page heading. Grapes are passed
//! on raw for the varietal canonicalizer.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::Html;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::record::{check_vintage, WineRecord, WineType, UNKNOWN_COUNTRY, UNKNOWN_REGION};
use crate::url::year_param;

pub mod fields;
pub mod html;
pub mod ld_json;
pub mod page_state;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

static COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d[\d,.]*)\s*([km])?\b").unwrap());

/// Fields one source was able to supply. `None` and empty mean "not found".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub vintage: Option<i32>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u64>,
    pub image_url: Option<String>,
    pub alcohol_percent: Option<f64>,
    pub wine_type: Option<WineType>,
    pub grapes: Vec<String>,
}

impl Candidate {
    /// Keeps every field already set and fills the rest from `lower`.
    pub fn or(self, lower: Candidate) -> Candidate {
        Candidate {
            vintage: self.vintage.or(lower.vintage),
            region: self.region.or(lower.region),
            country: self.country.or(lower.country),
            rating: self.rating.or(lower.rating),
            rating_count: self.rating_count.or(lower.rating_count),
            image_url: self.image_url.or(lower.image_url),
            alcohol_percent: self.alcohol_percent.or(lower.alcohol_percent),
            wine_type: self.wine_type.or(lower.wine_type),
            grapes: if self.grapes.is_empty() {
                lower.grapes
            } else {
                self.grapes
            },
        }
    }
}

/// The cascade's output: a record with unnormalized region/country and the raw grape list.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: WineRecord,
    pub raw_grapes: Vec<String>,
}

/// Runs the cascade over `html`, fetched from `url`.
pub fn extract(html: &str, url: &str) -> Result<Extraction, ScrapeError> {
    let doc = Html::parse_document(html);

    let heading = html::title(&doc).ok_or_else(|| {
        warn!(url, "no heading on page");
        ScrapeError::no_title(url, "Extract")
    })?;
    if html::is_error_heading(&heading) {
        warn!(url, heading = %heading, "page is an error page");
        return Err(ScrapeError::error_page(url, "Extract", &heading));
    }

    let candidate = [
        page_state::extract(&doc),
        ld_json::extract(&doc),
        html::extract(&doc),
    ]
    .into_iter()
    .fold(Candidate::default(), Candidate::or);

    let (name, vintage) = match candidate.vintage {
        Some(v) => (strip_year(&heading, v), Some(v)),
        None => match split_year(&heading) {
            Some((name, year)) => (name, Some(year)),
            None => (heading, None),
        },
    };
    let vintage = vintage
        .or_else(|| html::vintage_element(&doc))
        .or_else(|| year_param(url).and_then(check_vintage));

    debug!(url, name = %name, ?vintage, grapes = candidate.grapes.len(), "extraction complete");

    let record = WineRecord {
        name,
        vintage,
        region: candidate.region.unwrap_or_else(|| UNKNOWN_REGION.to_string()),
        country: candidate.country.unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
        rating: candidate.rating,
        rating_count: candidate.rating_count,
        image_url: candidate.image_url,
        alcohol_percent: candidate.alcohol_percent,
        wine_type: candidate.wine_type,
        ..WineRecord::new("")
    };

    Ok(Extraction {
        record,
        raw_grapes: candidate.grapes,
    })
}

/// The first plausible 4-digit year in `text`.
pub fn find_year(text: &str) -> Option<i32> {
    YEAR_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .find_map(check_vintage)
}

/// Removes every 4-digit year from `text` and tidies the spacing.
pub fn strip_years(text: &str) -> String {
    fields::normalize_whitespace(&YEAR_RE.replace_all(text, ""))
}

/// Splits a heading like "Château Example 2018" into name and year.
fn split_year(heading: &str) -> Option<(String, i32)> {
    let year = find_year(heading)?;
    let name = strip_year(heading, year);
    if name == heading {
        return None;
    }
    Some((name, year))
}

/// Removes one specific year from a heading, unless that would leave nothing.
fn strip_year(heading: &str, year: i32) -> String {
    let year = year.to_string();
    let removed = YEAR_RE.replace_all(heading, |caps: &Captures| {
        if caps[0] == year {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    let name = fields::normalize_whitespace(&removed);
    if name.is_empty() {
        heading.to_string()
    } else {
        name
    }
}

/// Reads a number that may be encoded as a JSON number or a string with a comma decimal.
pub(crate) fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Reads an integer that may be encoded as a JSON number or a string.
pub(crate) fn json_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a count given as a JSON number or as text like "1,234" or "1.2K ratings".
pub(crate) fn json_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}

/// Parses the first count in `text`. A K or M suffix scales a decimal value
/// (comma or dot); without one, separators are dropped.
pub fn parse_count(text: &str) -> Option<u64> {
    let caps = COUNT_RE.captures(text)?;
    let digits = &caps[1];
    match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(suffix) => {
            let value: f64 = digits.trim_end_matches([',', '.']).replace(',', ".").parse().ok()?;
            let scale = if suffix == "k" { 1_000.0 } else { 1_000_000.0 };
            Some((value * scale).round() as u64)
        }
        None => digits
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok(),
    }
}

/// Reads a non-empty, whitespace-normalized string.
pub(crate) fn json_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(fields::normalize_whitespace)
        .filter(|s| !s.is_empty())
}

/// Reads `value.name` if `value` is an object, or `value` itself if it is a string.
pub(crate) fn json_name(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("name").and_then(json_str),
        other => json_str(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_candidate_or_keeps_higher_priority_values() {
        let high = Candidate {
            wine_type: Some(WineType::Red),
            grapes: vec!["Merlot".into()],
            ..Default::default()
        };
        let low = Candidate {
            wine_type: Some(WineType::White),
            rating: Some(4.1),
            grapes: vec!["Chardonnay".into()],
            ..Default::default()
        };
        let merged = high.or(low);
        assert_eq!(merged.wine_type, Some(WineType::Red));
        assert_eq!(merged.rating, Some(4.1));
        assert_eq!(merged.grapes, vec!["Merlot".to_string()]);
    }

    #[test]
    fn test_missing_heading_is_no_title() {
        let err = extract("<html><body><p>hi</p></body></html>", "https://x.com/w/1").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NoTitle);
    }

    #[test]
    fn test_error_heading_is_error_page() {
        for heading in ["404", "Page Not Found", "Sorry, wine not found"] {
            let html = format!("<html><body><h1>{}</h1></body></html>", heading);
            let err = extract(&html, "https://x.com/w/1").unwrap_err();
            assert_eq!(err.code, crate::error::ErrorCode::ErrorPage, "heading {heading}");
        }
    }

    #[test]
    fn test_vintage_from_heading_is_stripped() {
        let ex = extract("<h1>Château Example 2018</h1>", "https://x.com/w/1").unwrap();
        assert_eq!(ex.record.name, "Château Example");
        assert_eq!(ex.record.vintage, Some(2018));
    }

    #[test]
    fn test_vintage_from_source_leaves_heading_alone() {
        let html = r#"<h1>Cuvée 1999 Edition</h1>
            <script type="application/ld+json">{"@type": "Wine", "vintage": 2015}</script>"#;
        let ex = extract(html, "https://x.com/w/1").unwrap();
        assert_eq!(ex.record.name, "Cuvée 1999 Edition");
        assert_eq!(ex.record.vintage, Some(2015));
    }

    #[test]
    fn test_source_vintage_stripped_from_heading() {
        let html = r#"<h1>Château Example 2018</h1>
            <script type="application/ld+json">{"@type": "Wine", "vintage": "2018"}</script>"#;
        let ex = extract(html, "https://x.com/w/1").unwrap();
        assert_eq!(ex.record.name, "Château Example");
        assert_eq!(ex.record.vintage, Some(2018));
    }

    #[test]
    fn test_year_stripping_respects_word_boundaries() {
        let ex = extract("<h1>Lot 20181 2018</h1>", "https://x.com/w/1").unwrap();
        assert_eq!(ex.record.name, "Lot 20181");
        assert_eq!(ex.record.vintage, Some(2018));

        let html = r#"<h1>Cuvée 120189 2018</h1>
            <script type="application/ld+json">{"@type": "Wine", "vintage": 2018}</script>"#;
        let ex = extract(html, "https://x.com/w/1").unwrap();
        assert_eq!(ex.record.name, "Cuvée 120189");
    }

    #[test]
    fn test_vintage_element_then_url() {
        let ex = extract(
            r#"<h1>Example Red</h1><span class="vintage">Vintage 2016</span>"#,
            "https://x.com/w/1?year=2012",
        )
        .unwrap();
        assert_eq!(ex.record.vintage, Some(2016));

        let ex = extract("<h1>Example Red</h1>", "https://x.com/w/1?year=2012").unwrap();
        assert_eq!(ex.record.vintage, Some(2012));
    }

    #[test]
    fn test_unknown_fields_use_sentinels() {
        let ex = extract("<h1>Plain</h1>", "https://x.com/w/1").unwrap();
        assert_eq!(ex.record.region, UNKNOWN_REGION);
        assert_eq!(ex.record.country, UNKNOWN_COUNTRY);
        assert_eq!(ex.record.vintage, None);
        assert!(ex.raw_grapes.is_empty());
    }

    #[test]
    fn test_find_and_strip_years() {
        assert_eq!(find_year("Reserve 1875 2019"), Some(2019));
        assert_eq!(strip_years("Example 2018  Reserve"), "Example Reserve");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("812 ratings"), Some(812));
        assert_eq!(parse_count("12,345 ratings"), Some(12345));
        assert_eq!(parse_count("1,2K ratings"), Some(1200));
        assert_eq!(parse_count("3.4k"), Some(3400));
        assert_eq!(parse_count("2M ratings"), Some(2_000_000));
        assert_eq!(parse_count("no ratings yet"), None);
        assert_eq!(json_count(&serde_json::json!(55)), Some(55));
        assert_eq!(json_count(&serde_json::json!("1.5K")), Some(1500));
    }

    #[test]
    fn test_json_number_helpers() {
        assert_eq!(json_f64(&serde_json::json!("4,2")), Some(4.2));
        assert_eq!(json_f64(&serde_json::json!(13.5)), Some(13.5));
        assert_eq!(json_i32(&serde_json::json!("2018")), Some(2018));
        assert_eq!(json_name(&serde_json::json!({"name": " Merlot "})), Some("Merlot".into()));
        assert_eq!(json_name(&serde_json::json!("Syrah")), Some("Syrah".into()));
    }
}

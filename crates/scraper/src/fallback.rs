// ABOUTME: Degraded-result builders: borrowing a neighbouring vintage and parsing the URL alone.
// ABOUTME: URL-derived records are always flagged for review.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;
use wino_taxonomy::{Hints, MatchResult, Taxonomy, VarietalList};

use crate::extract::strip_years;
use crate::record::{check_vintage, WineRecord};
use crate::url::year_param;

/// Slug form: `/{cc}/{lang}/{slug}/w/{id}` or `/{slug}/w/{id}`.
static SLUG_FORM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(?:[a-zA-Z]{2}/)?([^/]+)/w/").unwrap());

/// Id form: `/wines/{id}`.
static ID_FORM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/wines/(\d+)").unwrap());

/// Longest run of trailing slug words tried as a region name.
const MAX_REGION_TOKENS: usize = 3;

/// Builds the record for the requested vintage from a neighbouring vintage's record.
///
/// The neighbour's rating and rating count belong to its own vintage and are dropped.
pub fn borrow_vintage(neighbour: WineRecord, year: i32) -> WineRecord {
    let name = match strip_years(&neighbour.name) {
        stripped if stripped.is_empty() => neighbour.name.clone(),
        stripped => stripped,
    };
    WineRecord {
        name,
        vintage: Some(year),
        rating: None,
        rating_count: None,
        needs_review: false,
        ..neighbour
    }
}

/// Derives a minimal record from the URL structure, or `None` if the URL has no known shape.
pub fn extract_from_url(
    raw: &str,
    taxonomy: &Taxonomy,
    varietals: &VarietalList,
) -> Option<WineRecord> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let path = parsed.path();
    let vintage = year_param(raw).and_then(check_vintage);

    let slug = SLUG_FORM_RE
        .captures(path)
        .map(|caps| caps[1].to_string())
        .filter(|slug| !title_case(&slug.replace('-', " ")).is_empty());

    let (name, region) = if let Some(slug) = slug {
        debug!(slug = %slug, "URL fallback matched slug form");
        (title_case(&slug.replace('-', " ")), region_from_slug(&slug, taxonomy))
    } else if let Some(caps) = ID_FORM_RE.captures(path) {
        debug!(id = &caps[1], "URL fallback matched id form");
        (format!("Vivino Wine ID {}", &caps[1]), None)
    } else {
        debug!(url = raw, "URL has no known wine shape");
        return None;
    };

    let mut record = WineRecord::new(name);
    record.vintage = vintage;
    record.needs_review = true;

    let empty = Hints::new();
    let hints = match &region {
        Some(m) => {
            record.country = m.country.clone();
            if let Some(deepest) = m.deepest() {
                record.region = deepest.to_string();
            }
            record.region_full = Some(m.display_path());
            &m.hints
        }
        None => &empty,
    };
    record.varietal = varietals.canonicalize::<&str>(&[], &record.name, hints);

    Some(record)
}

/// Tries the trailing slug words, longest run first, against the taxonomy.
fn region_from_slug(slug: &str, taxonomy: &Taxonomy) -> Option<MatchResult> {
    let tokens: Vec<&str> = slug.split('-').filter(|t| !t.is_empty()).collect();
    let max = MAX_REGION_TOKENS.min(tokens.len().saturating_sub(1));
    (1..=max).rev().find_map(|n| {
        let text = tokens[tokens.len() - n..].join(" ");
        taxonomy.match_region(&text, None)
    })
}

/// Capitalizes the first letter of every word and lowercases the rest.
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn taxonomy() -> Taxonomy {
        Taxonomy::from_value(&json!({
            "France": {
                "regions": {
                    "Bordeaux": {
                        "subregions": { "Pomerol": { "hints": { "bordeaux_bank": "right" } } }
                    }
                }
            },
            "United States": {
                "regions": { "California": { "subregions": { "Napa |Valley": {} } } }
            }
        }))
        .unwrap()
    }

    fn varietals() -> VarietalList {
        VarietalList::new(["Cabernet Sauvignon", "Merlot", "Cabernet Franc"])
    }

    #[test]
    fn test_id_form() {
        let r = extract_from_url("https://www.vivino.com/wines/12345", &taxonomy(), &varietals()).unwrap();
        assert_eq!(r.name, "Vivino Wine ID 12345");
        assert!(r.needs_review);
        assert_eq!(r.vintage, None);
        assert_eq!(r.rating, None);
        assert_eq!(r.image_url, None);
        assert_eq!(r.wine_type, None);
    }

    #[test]
    fn test_id_form_with_year() {
        let r = extract_from_url("https://www.vivino.com/wines/12345?year=2016", &taxonomy(), &varietals())
            .unwrap();
        assert_eq!(r.vintage, Some(2016));
    }

    #[test]
    fn test_slug_form_with_region_and_grape() {
        let r = extract_from_url(
            "https://www.vivino.com/US/en/example-estate-cabernet-sauvignon-napa-valley/w/987?year=2019",
            &taxonomy(),
            &varietals(),
        )
        .unwrap();
        assert_eq!(r.name, "Example Estate Cabernet Sauvignon Napa Valley");
        assert_eq!(r.vintage, Some(2019));
        assert_eq!(r.region, "Napa Valley");
        assert_eq!(r.country, "United States");
        assert_eq!(r.region_full.as_deref(), Some("Napa Valley, California, United States"));
        assert_eq!(r.varietal, "Cabernet Sauvignon");
        assert!(r.needs_review);
    }

    #[test]
    fn test_slug_without_region() {
        let r = extract_from_url("https://www.vivino.com/chateau-example/w/1", &taxonomy(), &varietals()).unwrap();
        assert_eq!(r.name, "Chateau Example");
        assert_eq!(r.region, "Unknown Region");
        assert_eq!(r.region_full, None);
        assert_eq!(r.varietal, "Unknown Varietal");
    }

    #[test]
    fn test_unknown_shape() {
        assert!(extract_from_url("https://www.vivino.com/explore", &taxonomy(), &varietals()).is_none());
        assert!(extract_from_url("::nonsense::", &taxonomy(), &varietals()).is_none());
    }

    #[test]
    fn test_slug_without_words_is_rejected() {
        assert!(extract_from_url("https://www.vivino.com/-/w/1", &taxonomy(), &varietals()).is_none());
        assert!(extract_from_url("https://www.vivino.com/US/en/---/w/1", &taxonomy(), &varietals()).is_none());
    }

    #[test]
    fn test_empty_slug_falls_through_to_id_form() {
        let r = extract_from_url("https://www.vivino.com/wines/42/-/w/1", &taxonomy(), &varietals()).unwrap();
        assert_eq!(r.name, "Vivino Wine ID 42");
    }

    #[test]
    fn test_borrow_vintage() {
        let mut neighbour = WineRecord::new("Château Example 2019");
        neighbour.vintage = Some(2019);
        neighbour.rating = Some(4.1);
        neighbour.rating_count = Some(230);
        neighbour.varietal = "Merlot".into();
        neighbour.image_url = Some("https://i/x.png".into());

        let r = borrow_vintage(neighbour, 2018);
        assert_eq!(r.name, "Château Example");
        assert_eq!(r.vintage, Some(2018));
        assert_eq!(r.rating, None);
        assert_eq!(r.rating_count, None);
        assert_eq!(r.varietal, "Merlot");
        assert_eq!(r.image_url.as_deref(), Some("https://i/x.png"));
    }
}

// ABOUTME: Extraction source scanning application/ld+json blocks for Product, Wine and WebPage data.
// ABOUTME: Malformed blocks are skipped one at a time; the rest of the scan continues.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

use super::{json_count, json_f64, json_i32, json_name, Candidate};
use crate::record::{check_rating, check_vintage};

static LD_JSON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script[type='application/ld+json']").unwrap());

/// Reads every linked-data block in document order.
pub fn extract(doc: &Html) -> Candidate {
    let mut out = Candidate::default();
    for (i, script) in doc.select(&LD_JSON_SELECTOR).enumerate() {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => visit(&value, &mut out),
            Err(e) => debug!(block = i, error = %e, "skipping malformed ld+json block"),
        }
    }
    out
}

fn visit(value: &Value, out: &mut Candidate) {
    match value {
        Value::Array(items) => {
            for item in items {
                visit(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(t) = map.get("@type") {
                if matches_type(t, "Product") {
                    read_product(map, out);
                }
                if matches_type(t, "Wine") {
                    read_wine(map, out);
                }
                if matches_type(t, "WebPage") {
                    read_web_page(map, out);
                }
            }
            if let Some(graph) = map.get("@graph") {
                visit(graph, out);
            }
        }
        _ => {}
    }
}

fn read_product(map: &Map<String, Value>, out: &mut Candidate) {
    if out.rating.is_none() {
        out.rating = map
            .get("aggregateRating")
            .and_then(|r| r.get("ratingValue"))
            .and_then(json_f64)
            .and_then(check_rating);
    }
    if out.rating_count.is_none() {
        out.rating_count = map.get("aggregateRating").and_then(|r| {
            ["ratingCount", "reviewCount"]
                .iter()
                .find_map(|k| r.get(*k).and_then(json_count))
        });
    }
    if let Some(Value::Object(wine)) = map.get("containsWine") {
        read_wine(wine, out);
    }
}

fn read_wine(map: &Map<String, Value>, out: &mut Candidate) {
    match map.get("grape") {
        Some(Value::Array(items)) => out.grapes.extend(items.iter().filter_map(json_name)),
        Some(single) => out.grapes.extend(json_name(single)),
        None => {}
    }
    if out.vintage.is_none() {
        out.vintage = map.get("vintage").and_then(json_i32).and_then(check_vintage);
    }
    if out.region.is_none() {
        out.region = map.get("region").and_then(json_name);
    }
    if out.country.is_none() {
        out.country = map.get("country").and_then(json_name);
    }
}

fn read_web_page(map: &Map<String, Value>, out: &mut Candidate) {
    let Some(location) = map.get("contentLocation") else {
        return;
    };
    if out.region.is_none() {
        out.region = json_name(location);
    }
    if out.country.is_none() {
        out.country = location
            .get("address")
            .and_then(|a| a.get("addressCountry"))
            .and_then(json_name);
    }
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s.eq_ignore_ascii_case(expected),
        Value::Array(arr) => arr.iter().any(|v| matches_type(v, expected)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(blocks: &[&str]) -> Html {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{}</script>"#, b))
            .collect();
        Html::parse_document(&format!("<html><head>{}</head><body><h1>x</h1></body></html>", scripts))
    }

    #[test]
    fn test_product_rating_and_contained_wine() {
        let d = doc(&[r#"{
            "@type": "Product",
            "aggregateRating": {"ratingValue": "4,3", "reviewCount": "1,024"},
            "containsWine": {"grape": [{"name": "Merlot"}, {"name": "Cabernet Franc"}], "vintage": "2018"}
        }"#]);
        let c = extract(&d);
        assert_eq!(c.rating, Some(4.3));
        assert_eq!(c.rating_count, Some(1024));
        assert_eq!(c.grapes, vec!["Merlot".to_string(), "Cabernet Franc".to_string()]);
        assert_eq!(c.vintage, Some(2018));
    }

    #[test]
    fn test_malformed_block_does_not_stop_scan() {
        let d = doc(&[
            r#"{"@type": "Product", "aggregateRating": "#,
            r#"{"@type": "Wine", "grape": {"name": "Syrah"}, "vintage": 2015,
                "region": {"name": "Barossa Valley"}, "country": {"name": "Australia"}}"#,
        ]);
        let c = extract(&d);
        assert_eq!(c.grapes, vec!["Syrah".to_string()]);
        assert_eq!(c.vintage, Some(2015));
        assert_eq!(c.region.as_deref(), Some("Barossa Valley"));
        assert_eq!(c.country.as_deref(), Some("Australia"));
    }

    #[test]
    fn test_graph_and_web_page_location() {
        let d = doc(&[r#"{"@graph": [
            {"@type": ["WebPage"], "contentLocation": {"name": "Napa Valley", "address": {"addressCountry": "United States"}}},
            {"@type": "Wine", "grape": ["Zinfandel", ""]}
        ]}"#]);
        let c = extract(&d);
        assert_eq!(c.region.as_deref(), Some("Napa Valley"));
        assert_eq!(c.country.as_deref(), Some("United States"));
        assert_eq!(c.grapes, vec!["Zinfandel".to_string()]);
    }

    #[test]
    fn test_first_block_wins_for_scalars() {
        let d = doc(&[
            r#"{"@type": "Product", "aggregateRating": {"ratingValue": 4.0}}"#,
            r#"{"@type": "Product", "aggregateRating": {"ratingValue": 3.1}}"#,
        ]);
        assert_eq!(extract(&d).rating, Some(4.0));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let d = doc(&[r#"{"@type": "Wine", "vintage": 1850, "aggregateRating": {"ratingValue": 9}}"#,
                      r#"{"@type": "Product", "aggregateRating": {"ratingValue": 87}}"#]);
        let c = extract(&d);
        assert_eq!(c.vintage, None);
        assert_eq!(c.rating, None);
    }
}

// ABOUTME: Extraction source reading the page-state JSON the wine page embeds for its own scripts.
// ABOUTME: Supplies bottle image, wine type code, alcohol, and region/country names.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::fields::absolutize_url;
use super::{json_count, json_f64, json_i32, json_str, Candidate};
use crate::record::{check_alcohol, check_vintage, WineType};

static PAGE_STATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"window\.__PRELOADED_STATE__\.vintagePageInformation\s*=\s*").unwrap()
});

static SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());

/// Finds and parses the page-state object, if any script declares one.
pub fn find_page_state(doc: &Html) -> Option<Value> {
    for script in doc.select(&SCRIPT_SELECTOR) {
        let text = script.text().collect::<String>();
        let Some(m) = PAGE_STATE_RE.find(&text) else {
            continue;
        };

        // Parse one JSON value and ignore whatever statement follows it.
        let mut values = serde_json::Deserializer::from_str(&text[m.end()..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) if value.is_object() => return Some(value),
            Some(Ok(_)) => debug!("page state is not an object, skipping"),
            Some(Err(e)) => debug!(error = %e, "malformed page state, skipping"),
            None => debug!("empty page state, skipping"),
        }
    }
    None
}

/// Reads the page-state source.
pub fn extract(doc: &Html) -> Candidate {
    let Some(state) = find_page_state(doc) else {
        return Candidate::default();
    };
    let vintage = &state["vintage"];
    let wine = &vintage["wine"];

    let image_url = ["bottle_large", "bottle_medium"]
        .iter()
        .find_map(|k| json_str(&vintage["image"]["variations"][*k]))
        .map(|u| absolutize_url(&u));

    let wine_type = wine["type_id"]
        .as_i64()
        .and_then(WineType::from_type_id);

    let alcohol_percent = json_f64(&vintage["wine_facts"]["alcohol"])
        .or_else(|| json_f64(&vintage["alcohol"]))
        .and_then(check_alcohol);

    let candidate = Candidate {
        image_url,
        wine_type,
        alcohol_percent,
        region: json_str(&wine["region"]["name"]),
        country: json_str(&wine["region"]["country"]["name"]),
        vintage: json_i32(&vintage["year"]).and_then(check_vintage),
        rating_count: json_count(&vintage["statistics"]["ratings_count"]),
        ..Default::default()
    };
    debug!(?candidate, "page state fields");
    candidate
}

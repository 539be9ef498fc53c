// ABOUTME: Structural HTML extraction source: heading, images, taxonomy links, rating, facts table.
// ABOUTME: Lowest-priority source; only fills what page state and linked data left empty.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::fields::{absolutize_url, element_text, extract_first_attr, extract_first_text};
use super::{find_year, parse_count, Candidate};
use crate::record::{check_alcohol, check_rating, WineType};

/// Heading selectors, most specific first.
const TITLE_SELECTORS: &[&str] = &[
    "h1[class*='wine-page-header__name']",
    "h1[class*='VintageTitle__wine']",
    "h1[class*='VintageTitle_wine']",
    "h1",
];

/// Heading fragments that mark a not-found or error page.
const ERROR_MARKERS: &[&str] = &["404", "not found", "page not found"];

const IMAGE_SELECTORS: &[&str] = &[
    "img[class*='wine-page-image__image']",
    "img[class*='vivinoImage_image']",
    "img[class*='image-preview__image']",
];

const RATING_SELECTORS: &[&str] = &[
    "div[class*='vivinoRating_averageValue']",
    "div[class*='community-score__score']",
];

const RATING_COUNT_SELECTORS: &[&str] = &[
    "[class*='vivinoRating_ratingsCount']",
    "[class*='vivinoRating_caption']",
    "[class*='community-score__total-ratings']",
    "[class*='review-score__count']",
];

const COUNTRY_LINK: &str = "/wine-countries/";
const REGION_LINK: &str = "/wine-regions/";
const GRAPE_LINK: &str = "/grapes/";

static PRELOAD_IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel='preload'][as='image']").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static FACT_LABEL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("th, div").unwrap());
static BREADCRUMB_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[class*='breadCrumbs'] a").unwrap());
static VINTAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("span.vintage").unwrap());

static ALCOHOL_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*alcohol content\s*$").unwrap());
static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2}(?:[.,]\d{1,2})?)\s*%").unwrap());

/// The wine's display name from the page heading.
pub fn title(doc: &Html) -> Option<String> {
    extract_first_text(doc, TITLE_SELECTORS)
}

/// Returns true if a heading reads like a not-found page.
pub fn is_error_heading(heading: &str) -> bool {
    let lower = heading.to_lowercase();
    ERROR_MARKERS.iter().any(|m| lower.contains(m))
}

/// A year from the dedicated vintage element.
pub fn vintage_element(doc: &Html) -> Option<i32> {
    doc.select(&VINTAGE_SELECTOR)
        .find_map(|el| find_year(&element_text(&el)))
}

/// Reads the structural fallbacks.
pub fn extract(doc: &Html) -> Candidate {
    let mut candidate = Candidate {
        image_url: image_url(doc),
        rating: rating(doc),
        rating_count: extract_first_text(doc, RATING_COUNT_SELECTORS).and_then(|t| parse_count(&t)),
        alcohol_percent: alcohol_percent(doc),
        wine_type: breadcrumb_wine_type(doc),
        ..Default::default()
    };

    for link in doc.select(&LINK_SELECTOR) {
        let href = link.value().attr("href").unwrap_or_default();
        let text = element_text(&link);
        if text.is_empty() {
            continue;
        }
        if href.contains(COUNTRY_LINK) {
            candidate.country.get_or_insert(text);
        } else if href.contains(REGION_LINK) {
            candidate.region.get_or_insert(text);
        } else if href.contains(GRAPE_LINK) && !text.to_lowercase().contains("blend") {
            candidate.grapes.push(text);
        }
    }

    debug!(?candidate, "html fallback fields");
    candidate
}

fn image_url(doc: &Html) -> Option<String> {
    preload_image(doc)
        .or_else(|| extract_first_attr(doc, IMAGE_SELECTORS, "src"))
        .or_else(|| extract_first_attr(doc, IMAGE_SELECTORS, "data-src"))
        .map(|u| absolutize_url(&u))
}

/// The preloaded bottle image; the last `imagesrcset` entry is the largest.
fn preload_image(doc: &Html) -> Option<String> {
    doc.select(&PRELOAD_IMAGE_SELECTOR).find_map(|el| {
        let from_srcset = el.value().attr("imagesrcset").and_then(|set| {
            set.split(',')
                .filter_map(|entry| entry.split_whitespace().next())
                .last()
                .map(str::to_string)
        });
        from_srcset.or_else(|| {
            el.value()
                .attr("href")
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
        })
    })
}

fn rating(doc: &Html) -> Option<f64> {
    let text = extract_first_text(doc, RATING_SELECTORS)?;
    text.replace(',', ".").parse().ok().and_then(check_rating)
}

/// The value cell next to an "Alcohol content" label in the facts table.
fn alcohol_percent(doc: &Html) -> Option<f64> {
    doc.select(&FACT_LABEL_SELECTOR)
        .filter(|el| ALCOHOL_LABEL_RE.is_match(&element_text(el)))
        .find_map(|label| {
            let cell = label
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|s| matches!(s.value().name(), "td" | "div"))?;
            let text = element_text(&cell);
            let caps = PERCENT_RE.captures(&text)?;
            caps[1].replace(',', ".").parse().ok().and_then(check_alcohol)
        })
}

fn breadcrumb_wine_type(doc: &Html) -> Option<WineType> {
    doc.select(&BREADCRUMB_LINK_SELECTOR)
        .find_map(|link| WineType::from_label(&element_text(&link)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <html><head>
            <link rel="preload" as="image" href="//images.example.com/small.png"
                  imagesrcset="//images.example.com/small.png 1x, //images.example.com/large.png 2x">
        </head><body>
            <div class="breadCrumbs__wrap"><a href="/explore">Explore</a><a href="/explore?type=red">Red wines</a></div>
            <h1 class="VintageTitle__wine--U7t9G">Château Example 2018</h1>
            <a href="/wine-countries/france">France</a>
            <a href="/wine-regions/pomerol">Pomerol</a>
            <a href="/wine-regions/bordeaux">Bordeaux</a>
            <a href="/grapes/merlot">Merlot</a>
            <a href="/grapes/bordeaux-blend">Bordeaux Blend</a>
            <a href="/grapes/cabernet-franc"> Cabernet  Franc </a>
            <div class="vivinoRating_averageValue__uDdPM">4,2</div>
            <div class="vivinoRating_caption__xL84P">2,3K ratings</div>
            <table><tr><th>Grapes</th><td>Merlot</td></tr>
                   <tr><th>Alcohol content</th><td>14.5%</td></tr></table>
        </body></html>
    "#;

    #[test]
    fn test_title_and_error_markers() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(title(&doc).as_deref(), Some("Château Example 2018"));
        assert!(is_error_heading("Oops! Page not found"));
        assert!(is_error_heading("Error 404"));
        assert!(!is_error_heading("Château Example"));
    }

    #[test]
    fn test_structural_fields() {
        let doc = Html::parse_document(PAGE);
        let c = extract(&doc);
        assert_eq!(c.image_url.as_deref(), Some("https://images.example.com/large.png"));
        assert_eq!(c.country.as_deref(), Some("France"));
        assert_eq!(c.region.as_deref(), Some("Pomerol"));
        assert_eq!(c.grapes, vec!["Merlot".to_string(), "Cabernet Franc".to_string()]);
        assert_eq!(c.rating, Some(4.2));
        assert_eq!(c.rating_count, Some(2300));
        assert_eq!(c.alcohol_percent, Some(14.5));
        assert_eq!(c.wine_type, Some(WineType::Red));
    }

    #[test]
    fn test_image_tag_fallback_uses_data_src() {
        let doc = Html::parse_document(
            r#"<h1>x</h1><img class="wine-page-image__image" data-src="//cdn.example.com/b.jpg">"#,
        );
        assert_eq!(extract(&doc).image_url.as_deref(), Some("https://cdn.example.com/b.jpg"));
    }

    #[test]
    fn test_preload_href_without_srcset() {
        let doc = Html::parse_document(
            r#"<link rel="preload" as="image" href="https://cdn.example.com/p.jpg"><h1>x</h1>"#,
        );
        assert_eq!(extract(&doc).image_url.as_deref(), Some("https://cdn.example.com/p.jpg"));
    }

    #[test]
    fn test_facts_in_divs() {
        let doc = Html::parse_document(
            r#"<h1>x</h1><div class="row"><div>Alcohol content</div><div>12,5 %</div></div>"#,
        );
        assert_eq!(extract(&doc).alcohol_percent, Some(12.5));
    }

    #[test]
    fn test_vintage_element() {
        let doc = Html::parse_document(r#"<h1>x</h1><span class="vintage">2011</span>"#);
        assert_eq!(vintage_element(&doc), Some(2011));
    }
}

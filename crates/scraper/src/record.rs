// ABOUTME: The WineRecord output type, the closed WineType set, and field validity checks.
// ABOUTME: Sentinel strings mark region, country and varietal values that could not be determined.

use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

pub use wino_taxonomy::UNKNOWN_VARIETAL;

pub const UNKNOWN_REGION: &str = "Unknown Region";
pub const UNKNOWN_COUNTRY: &str = "Unknown Country";

/// Oldest vintage accepted from any source.
pub const MIN_VINTAGE: i32 = 1900;

/// The closed set of wine styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WineType {
    Red,
    White,
    Sparkling,
    #[serde(rename = "Rosé")]
    Rose,
    Dessert,
    Fortified,
}

impl WineType {
    pub const ALL: [WineType; 6] = [
        WineType::Red,
        WineType::White,
        WineType::Sparkling,
        WineType::Rose,
        WineType::Dessert,
        WineType::Fortified,
    ];

    /// Maps the numeric type code used in embedded page state.
    pub fn from_type_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(WineType::Red),
            2 => Some(WineType::White),
            3 => Some(WineType::Sparkling),
            4 => Some(WineType::Rose),
            7 => Some(WineType::Dessert),
            24 => Some(WineType::Fortified),
            _ => None,
        }
    }

    /// Finds the first type whose label occurs in `text`, e.g. "Red wines" or "Rosé".
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| text.contains(t.as_str()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WineType::Red => "Red",
            WineType::White => "White",
            WineType::Sparkling => "Sparkling",
            WineType::Rose => "Rosé",
            WineType::Dessert => "Dessert",
            WineType::Fortified => "Fortified",
        }
    }
}

impl fmt::Display for WineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scraped wine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineRecord {
    pub name: String,
    pub vintage: Option<i32>,
    /// Comma-joined canonical grape names, or [`UNKNOWN_VARIETAL`].
    pub varietal: String,
    pub region: String,
    /// Deepest-first display path such as "Pomerol, Bordeaux, France".
    pub region_full: Option<String>,
    pub country: String,
    /// Community rating on a 0-5 scale.
    pub rating: Option<f64>,
    /// How many community ratings the score is based on.
    pub rating_count: Option<u64>,
    pub image_url: Option<String>,
    pub alcohol_percent: Option<f64>,
    pub wine_type: Option<WineType>,
    /// Set only on records derived from the URL alone.
    pub needs_review: bool,
}

impl WineRecord {
    /// A record with the given name and every other field unknown.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vintage: None,
            varietal: UNKNOWN_VARIETAL.to_string(),
            region: UNKNOWN_REGION.to_string(),
            region_full: None,
            country: UNKNOWN_COUNTRY.to_string(),
            rating: None,
            rating_count: None,
            image_url: None,
            alcohol_percent: None,
            wine_type: None,
            needs_review: false,
        }
    }

    pub fn has_region(&self) -> bool {
        self.region != UNKNOWN_REGION
    }

    pub fn has_country(&self) -> bool {
        self.country != UNKNOWN_COUNTRY
    }
}

/// Newest vintage accepted: a few years past the current one for pre-release listings.
pub fn max_vintage() -> i32 {
    chrono::Utc::now().year() + 5
}

pub fn check_vintage(year: i32) -> Option<i32> {
    (MIN_VINTAGE..=max_vintage()).contains(&year).then_some(year)
}

pub fn check_rating(rating: f64) -> Option<f64> {
    (0.0..=5.0).contains(&rating).then_some(rating)
}

pub fn check_alcohol(percent: f64) -> Option<f64> {
    (percent > 0.0 && percent < 100.0).then_some(percent)
}

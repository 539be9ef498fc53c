// ABOUTME: Varietal reference list and the canonicalizer that turns raw grape names into an ordered varietal string.
// ABOUTME: Applies dedup, title augmentation, regional blend ordering, title-position ordering and name-variant resolution.

//! Varietal canonicalization.
//!
//! Steps, in order:
//! 1. Deduplicate (case-insensitive, first seen wins) and drop generic tokens.
//! 2. Append reference varieties named as whole words in the title.
//! 3. Reorder by the first recognized blend-style hint.
//! 4. Move varieties named in the title to the front, by title position.
//! 5. Collapse regional name variants (Syrah/Shiraz, ...) onto one spelling.
//!
//! Steps 3 and 4 treat both spellings of a variant pair as the same grape, which
//! keeps the whole operation idempotent on its own output.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::TaxonomyError;
use crate::tree::Hints;

/// Sentinel used when no grape could be determined.
pub const UNKNOWN_VARIETAL: &str = "Unknown Varietal";

/// Hint key holding the region override table for name variants.
pub const VARIETAL_OVERRIDES_HINT: &str = "varietal_overrides";

/// Blend-style hint keys in precedence order. Only the first one present is consulted.
pub const BLEND_STYLE_KEYS: &[&str] = &["bordeaux_bank", "rhone_style", "blend_style"];

/// Pairs of names for the same grape. The first form is the default.
pub const NAME_VARIANTS: &[(&str, &str)] = &[
    ("Syrah", "Shiraz"),
    ("Grenache", "Garnacha"),
    ("Pinot Gris", "Pinot Grigio"),
    ("Mourvèdre", "Monastrell"),
];

const GENERIC_TOKENS: &[&str] = &[
    "wine",
    "blend",
    "red wine",
    "white wine",
    "rosé wine",
    "sparkling wine",
    "dessert wine",
    "fortified wine",
    "red blend",
    "white blend",
];

/// Dominant varieties for a blend-style hint value, in priority order.
fn blend_priority(key: &str, value: &str) -> Option<&'static [&'static str]> {
    let value = value.trim().to_lowercase();
    let order: &'static [&'static str] = match (key, value.as_str()) {
        ("bordeaux_bank", "left") => &[
            "Cabernet Sauvignon",
            "Merlot",
            "Cabernet Franc",
            "Petit Verdot",
            "Malbec",
        ],
        ("bordeaux_bank", "right") => &["Merlot", "Cabernet Franc", "Cabernet Sauvignon"],
        ("rhone_style", "northern") => &["Syrah", "Viognier", "Marsanne", "Roussanne"],
        ("rhone_style", "southern") => &["Grenache", "Syrah", "Mourvèdre", "Cinsault", "Carignan"],
        ("blend_style", "chianti") => &["Sangiovese", "Canaiolo", "Colorino"],
        ("blend_style", "rioja") => &["Tempranillo", "Grenache", "Graciano", "Mazuelo"],
        ("blend_style", "champagne") => &["Chardonnay", "Pinot Noir", "Pinot Meunier"],
        ("blend_style", "douro") | ("blend_style", "port") => &[
            "Touriga Nacional",
            "Touriga Franca",
            "Tinta Roriz",
            "Tinta Barroca",
            "Tinto Cão",
        ],
        ("blend_style", "southern_french") => &["Grenache", "Syrah", "Mourvèdre", "Carignan"],
        _ => return None,
    };
    Some(order)
}

/// The flat set of known grape names used for title matching.
#[derive(Debug, Clone, Default)]
pub struct VarietalList {
    names: Vec<String>,
}

impl VarietalList {
    /// Builds a list from names, skipping blanks and case-insensitive duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name: String = name.into();
            let name = name.trim();
            if !name.is_empty() && !out.iter().any(|n| same_name(n, name)) {
                out.push(name.to_string());
            }
        }
        Self { names: out }
    }

    /// Parses a JSON array of strings.
    pub fn from_json_str(json: &str) -> Result<Self, TaxonomyError> {
        let value: Value = serde_json::from_str(json)?;
        let items = value
            .as_array()
            .ok_or_else(|| TaxonomyError::shape("$", "array of strings"))?;
        let mut names = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let name = item
                .as_str()
                .ok_or_else(|| TaxonomyError::shape(format!("$[{}]", i), "string"))?;
            names.push(name.to_string());
        }
        Ok(Self::new(names))
    }

    /// Reads and parses a JSON file holding an array of grape names.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TaxonomyError::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Canonicalizes raw grape names into the final comma-joined varietal string.
    ///
    /// Returns [`UNKNOWN_VARIETAL`] when nothing usable remains.
    pub fn canonicalize<S: AsRef<str>>(&self, raw: &[S], title: &str, hints: &Hints) -> String {
        let list = self.canonical_list(raw, title, hints);
        if list.is_empty() {
            UNKNOWN_VARIETAL.to_string()
        } else {
            list.join(", ")
        }
    }

    /// Same as [`canonicalize`](Self::canonicalize) but returns the ordered list.
    pub fn canonical_list<S: AsRef<str>>(&self, raw: &[S], title: &str, hints: &Hints) -> Vec<String> {
        let title_lower = title.to_lowercase();

        let mut list = self.dedupe(raw);
        self.augment_from_title(&mut list, &title_lower);
        let list = reorder_by_blend_style(list, hints);
        let list = reorder_by_title_position(list, &title_lower);
        let list = resolve_name_variants(list, &title_lower, hints);

        debug!(?list, title, "varietals canonicalized");
        list
    }

    fn dedupe<S: AsRef<str>>(&self, raw: &[S]) -> Vec<String> {
        let mut list: Vec<String> = Vec::new();
        for g in raw {
            let g = g.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
            if g.is_empty() || is_generic(&g) {
                continue;
            }
            // Prefer the reference spelling when it differs only by case.
            let g = self
                .names
                .iter()
                .find(|n| same_name(n, &g))
                .cloned()
                .unwrap_or(g);
            if !list.iter().any(|x| same_name(x, &g)) {
                list.push(g);
            }
        }
        list
    }

    fn augment_from_title(&self, list: &mut Vec<String>, title_lower: &str) {
        for name in &self.names {
            if list.iter().any(|g| same_name(g, name)) {
                continue;
            }
            if find_whole_word(title_lower, &name.to_lowercase()).is_some() {
                debug!(grape = %name, "augmented varietals from title");
                list.push(name.clone());
            }
        }
    }
}

/// Splits a finalized varietal string back into its names.
pub fn split_varietal(varietal: &str) -> Vec<String> {
    if varietal == UNKNOWN_VARIETAL {
        return Vec::new();
    }
    varietal
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn reorder_by_blend_style(list: Vec<String>, hints: &Hints) -> Vec<String> {
    let Some((key, value)) = BLEND_STYLE_KEYS
        .iter()
        .find_map(|k| hints.get(*k).map(|v| (*k, v)))
    else {
        return list;
    };

    let Some(priority) = value.as_str().and_then(|v| blend_priority(key, v)) else {
        debug!(key, %value, "unrecognized blend style, keeping order");
        return list;
    };

    let mut ordered: Vec<String> = Vec::with_capacity(list.len());
    for preferred in priority {
        for g in &list {
            if same_grape(g, preferred) && !ordered.contains(g) {
                ordered.push(g.clone());
            }
        }
    }
    for g in &list {
        if !ordered.contains(g) {
            ordered.push(g.clone());
        }
    }
    debug!(key, ?ordered, "blend style ordering applied");
    ordered
}

fn reorder_by_title_position(list: Vec<String>, title_lower: &str) -> Vec<String> {
    let mut in_title: Vec<(usize, String)> = Vec::new();
    let mut rest: Vec<String> = Vec::new();

    for g in list {
        let pos = spellings(&g)
            .iter()
            .filter_map(|s| title_lower.find(&s.to_lowercase()))
            .min();
        match pos {
            Some(p) => in_title.push((p, g)),
            None => rest.push(g),
        }
    }

    in_title.sort_by_key(|(p, _)| *p);
    in_title.into_iter().map(|(_, g)| g).chain(rest).collect()
}

fn resolve_name_variants(list: Vec<String>, title_lower: &str, hints: &Hints) -> Vec<String> {
    let mut list = list;

    for &(default, alternate) in NAME_VARIANTS {
        if !list.iter().any(|g| same_name(g, default) || same_name(g, alternate)) {
            continue;
        }

        let chosen = preferred_form(default, alternate, title_lower, hints);
        let mut out: Vec<String> = Vec::with_capacity(list.len());
        for g in list {
            let g = if same_name(&g, default) || same_name(&g, alternate) {
                chosen.to_string()
            } else {
                g
            };
            if !out.iter().any(|x| same_name(x, &g)) {
                out.push(g);
            }
        }
        list = out;
    }

    list
}

/// Title mention first, then region override, then the default form.
fn preferred_form(
    default: &'static str,
    alternate: &'static str,
    title_lower: &str,
    hints: &Hints,
) -> &'static str {
    let in_title = |form: &str| title_lower.find(&form.to_lowercase());
    match (in_title(default), in_title(alternate)) {
        (Some(d), Some(a)) => return if a < d { alternate } else { default },
        (Some(_), None) => return default,
        (None, Some(_)) => return alternate,
        (None, None) => {}
    }

    if let Some(overrides) = hints.get(VARIETAL_OVERRIDES_HINT).and_then(|v| v.as_object()) {
        for (from, to) in overrides {
            if !(same_name(from, default) || same_name(from, alternate)) {
                continue;
            }
            match to.as_str() {
                Some(t) if same_name(t, alternate) => return alternate,
                Some(t) if same_name(t, default) => return default,
                _ => {}
            }
        }
    }

    default
}

fn is_generic(name: &str) -> bool {
    let lower = name.to_lowercase();
    GENERIC_TOKENS.iter().any(|t| *t == lower)
}

fn same_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Both spellings of a grape when it belongs to a variant pair, else just itself.
fn spellings(name: &str) -> Vec<&str> {
    for &(default, alternate) in NAME_VARIANTS {
        if same_name(name, default) || same_name(name, alternate) {
            return vec![default, alternate];
        }
    }
    vec![name]
}

fn same_grape(a: &str, b: &str) -> bool {
    spellings(a).iter().any(|s| same_name(s, b))
}

/// Finds `needle` in `haystack` at word boundaries. Both must already be lowercase.
fn find_whole_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let is_word = |c: char| c.is_alphanumeric();
    let mut start = 0;
    while let Some(offset) = haystack[start..].find(needle) {
        let pos = start + offset;
        let end = pos + needle.len();
        let before_ok = haystack[..pos].chars().next_back().map_or(true, |c| !is_word(c));
        let after_ok = haystack[end..].chars().next().map_or(true, |c| !is_word(c));
        if before_ok && after_ok {
            return Some(pos);
        }
        start = pos + needle.chars().next().map_or(1, char::len_utf8);
    }
    None
}

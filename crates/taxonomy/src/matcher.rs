// ABOUTME: Region matcher that resolves free-text region/country pairs against the taxonomy tree.
// ABOUTME: Depth-first, first-match traversal with alias-aware comparison and inherited hints.

use serde::Serialize;
use tracing::debug;

use crate::normalize::{normalize_key, strip_region_suffixes};
use crate::tree::{Hints, Level, Taxonomy, TaxonomyNode};

/// The single path through the taxonomy selected for a region string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub country: String,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub subsubregion: Option<String>,
    /// Hints accumulated from the country down to the matched node; deeper wins.
    pub hints: Hints,
}

impl MatchResult {
    fn from_path(path: &[&TaxonomyNode]) -> Self {
        let mut result = MatchResult {
            country: String::new(),
            region: None,
            subregion: None,
            subsubregion: None,
            hints: Hints::new(),
        };

        for node in path {
            let name = node.name.canonical().to_string();
            match node.level {
                Level::Country => result.country = name,
                Level::Region => result.region = Some(name),
                Level::Subregion => result.subregion = Some(name),
                Level::Subsubregion => result.subsubregion = Some(name),
            }
            for (k, v) in &node.hints {
                result.hints.insert(k.clone(), v.clone());
            }
        }

        result
    }

    /// The most specific matched place below country level.
    pub fn deepest(&self) -> Option<&str> {
        self.subsubregion
            .as_deref()
            .or(self.subregion.as_deref())
            .or(self.region.as_deref())
    }

    /// Deepest-first display path, e.g. "Pomerol, Bordeaux, France".
    pub fn display_path(&self) -> String {
        [
            self.subsubregion.as_deref(),
            self.subregion.as_deref(),
            self.region.as_deref(),
            Some(self.country.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Returns a hint value as a string, if present and a string.
    pub fn hint_str(&self, key: &str) -> Option<&str> {
        self.hints.get(key).and_then(|v| v.as_str())
    }
}

impl Taxonomy {
    /// Resolves a free-text region (and optional country) to a taxonomy path.
    ///
    /// The search is restricted to the hinted country when it exists in the
    /// taxonomy; otherwise every country is searched in document order. The
    /// first node (depth-first) whose name matches wins. When nothing matches
    /// below country level, a valid country hint still yields a country-only
    /// result carrying the country's hints.
    pub fn match_region(&self, region_text: &str, country_hint: Option<&str>) -> Option<MatchResult> {
        let hinted = country_hint.and_then(|c| self.country(c));
        let cleaned = strip_region_suffixes(region_text);
        let key = normalize_key(&cleaned);

        if !key.is_empty() {
            let scope: &[TaxonomyNode] = match hinted {
                Some(country) => std::slice::from_ref(country),
                None => self.countries(),
            };

            for country in scope {
                let mut path = vec![country];
                if find_path(&country.children, &key, &mut path) {
                    let result = MatchResult::from_path(&path);
                    debug!(input = region_text, matched = %result.display_path(), "region matched");
                    return Some(result);
                }
            }

            // The text may name a country rather than a region.
            if let Some(country) = scope.iter().find(|c| c.name.matches_key(&key)) {
                return Some(MatchResult::from_path(&[country]));
            }
        }

        match hinted {
            Some(country) => {
                debug!(input = region_text, country = country.name.canonical(), "region unmatched, using country");
                Some(MatchResult::from_path(&[country]))
            }
            None => {
                debug!(input = region_text, "region unmatched");
                None
            }
        }
    }
}

/// Depth-first search for the first node matching `key`, recording the path taken.
fn find_path<'t>(nodes: &'t [TaxonomyNode], key: &str, path: &mut Vec<&'t TaxonomyNode>) -> bool {
    for node in nodes {
        path.push(node);
        if node.name.matches_key(key) || find_path(&node.children, key, path) {
            return true;
        }
        path.pop();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fixture() -> Taxonomy {
        Taxonomy::from_value(&json!({
            "United States": {
                "regions": {
                    "Napa |Valley": {
                        "subregions": {
                            "Oakville": {}
                        }
                    }
                }
            },
            "France": {
                "hints": { "tier": "country" },
                "regions": {
                    "Bordeaux": {
                        "hints": { "tier": "region", "bordeaux_bank": "left" },
                        "subregions": {
                            "Pomerol": { "hints": { "bordeaux_bank": "right" } },
                            "Médoc": { "subsubregions": ["Pauillac", "Margaux"] }
                        }
                    }
                }
            },
            "Italy": {
                "regions": {
                    "Tuscany": { "subregions": { "Margaux": {} } }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_alias_base_and_full_form_match() {
        let tax = fixture();
        for input in ["Napa", "Napa Valley", "napa-valley"] {
            let m = tax.match_region(input, None).unwrap();
            assert_eq!(m.region.as_deref(), Some("Napa Valley"), "input {input}");
            assert_eq!(m.country, "United States");
        }
    }

    #[test]
    fn test_suffix_stripped_before_matching() {
        let tax = fixture();
        let m = tax.match_region("Napa Valley AVA", Some("United States")).unwrap();
        assert_eq!(m.region.as_deref(), Some("Napa Valley"));
    }

    #[test]
    fn test_deeper_hint_overrides_shallower() {
        let tax = fixture();
        let m = tax.match_region("Pomerol", None).unwrap();
        assert_eq!(m.hint_str("bordeaux_bank"), Some("right"));
        assert_eq!(m.hint_str("tier"), Some("region"));
        assert_eq!(m.display_path(), "Pomerol, Bordeaux, France");
        assert_eq!(m.deepest(), Some("Pomerol"));
    }

    #[test]
    fn test_subsubregion_inherits_ancestor_hints() {
        let tax = fixture();
        let m = tax.match_region("Pauillac", Some("France")).unwrap();
        assert_eq!(m.subsubregion.as_deref(), Some("Pauillac"));
        assert_eq!(m.subregion.as_deref(), Some("Médoc"));
        assert_eq!(m.hint_str("bordeaux_bank"), Some("left"));
    }

    #[test]
    fn test_first_match_in_document_order_without_hint() {
        let tax = fixture();
        let m = tax.match_region("Margaux", None).unwrap();
        assert_eq!(m.country, "France");
    }

    #[test]
    fn test_country_hint_restricts_search() {
        let tax = fixture();
        let m = tax.match_region("Margaux", Some("Italy")).unwrap();
        assert_eq!(m.country, "Italy");
        assert_eq!(m.subregion.as_deref(), Some("Margaux"));
    }

    #[test]
    fn test_unknown_country_hint_searches_everything() {
        let tax = fixture();
        let m = tax.match_region("Oakville", Some("Atlantis")).unwrap();
        assert_eq!(m.country, "United States");
    }

    #[test]
    fn test_unmatched_region_with_valid_country() {
        let tax = fixture();
        let m = tax.match_region("Somewhere Else", Some("France")).unwrap();
        assert_eq!(m.country, "France");
        assert_eq!(m.region, None);
        assert_eq!(m.hint_str("tier"), Some("country"));
        assert_eq!(m.display_path(), "France");
    }

    #[test]
    fn test_region_text_naming_a_country() {
        let tax = fixture();
        let m = tax.match_region("France", None).unwrap();
        assert_eq!(m.country, "France");
        assert_eq!(m.deepest(), None);
    }

    #[test]
    fn test_nothing_matches() {
        let tax = fixture();
        assert!(tax.match_region("Somewhere Else", None).is_none());
        assert!(tax.match_region("", None).is_none());
    }
}

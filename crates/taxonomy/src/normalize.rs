// ABOUTME: Text normalization helpers shared by the region matcher and the taxonomy tree.
// ABOUTME: Provides comparison keys and trailing appellation-qualifier stripping.

use once_cell::sync::Lazy;
use regex::Regex;

// Acronyms are matched case-sensitively so ordinary trailing words ("Do", "Ac") survive.
static TRAILING_QUALIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\s+(?:AVA|AOC|AOP|AC|DOCG|DOCa|DOC|DOQ|DO|IGT|IGP|VdP|GI|WO|(?i:appellation d'origine contr[oô]l[eé]e)|(?i:appellation))\s*$",
    )
    .unwrap()
});

/// Builds the comparison key for a place name: lowercase with spaces and hyphens removed.
///
/// "Saint-Julien" and "saint julien" both become "saintjulien".
pub fn normalize_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Strips redundant appellation/classification qualifiers from the end of a region string.
///
/// Qualifiers are removed repeatedly, so "Barolo DOCG DOC" becomes "Barolo".
/// The remaining text is trimmed.
pub fn strip_region_suffixes(s: &str) -> String {
    let mut current = s.trim().to_string();
    loop {
        let stripped = TRAILING_QUALIFIER_RE.replace(&current, "").trim().to_string();
        if stripped == current || stripped.is_empty() {
            return current;
        }
        current = stripped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_strips_spaces_hyphens_case() {
        assert_eq!(normalize_key("Saint-Julien"), "saintjulien");
        assert_eq!(normalize_key("saint julien"), "saintjulien");
        assert_eq!(normalize_key("  Napa  Valley "), "napavalley");
    }

    #[test]
    fn test_normalize_key_keeps_accents() {
        assert_eq!(normalize_key("Côte-Rôtie"), "côterôtie");
    }

    #[test]
    fn test_strip_ava() {
        assert_eq!(strip_region_suffixes("Napa Valley AVA"), "Napa Valley");
    }

    #[test]
    fn test_strip_repeated_qualifiers() {
        assert_eq!(strip_region_suffixes("Barolo DOCG DOC"), "Barolo");
        assert_eq!(strip_region_suffixes("Rioja DOCa"), "Rioja");
    }

    #[test]
    fn test_strip_appellation_words() {
        assert_eq!(strip_region_suffixes("Pomerol Appellation"), "Pomerol");
        assert_eq!(
            strip_region_suffixes("Margaux Appellation d'Origine Contrôlée"),
            "Margaux"
        );
    }

    #[test]
    fn test_strip_leaves_plain_names() {
        assert_eq!(strip_region_suffixes("Douro"), "Douro");
        assert_eq!(strip_region_suffixes(" Mendoza "), "Mendoza");
    }

    #[test]
    fn test_strip_never_empties_string() {
        assert_eq!(strip_region_suffixes("AVA"), "AVA");
    }

    #[test]
    fn test_strip_ignores_lowercase_acronym_lookalikes() {
        assert_eq!(strip_region_suffixes("Vinho Do"), "Vinho Do");
    }
}

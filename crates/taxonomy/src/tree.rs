// ABOUTME: Typed recursive taxonomy tree (country > region > subregion > subsubregion) and its JSON loader.
// ABOUTME: Parses alias names of the form "Base |Suffix" and carries per-node disambiguation hints.

//! The taxonomy store.
//!
//! The on-disk format is a JSON object keyed by country name:
//!
//! ```json
//! {
//!   "France": {
//!     "code": "FR",
//!     "hints": {},
//!     "regions": {
//!       "Bordeaux": {
//!         "subregions": {
//!           "Pomerol": { "hints": { "bordeaux_bank": "right" } }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Key order is significant: the matcher walks nodes in document order and
//! the first match wins, so the loader keeps the original order.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::TaxonomyError;
use crate::normalize::normalize_key;

/// Disambiguation flags attached to a node. Inherited by descendants.
pub type Hints = Map<String, Value>;

/// The depth of a node in the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Country,
    Region,
    Subregion,
    Subsubregion,
}

impl Level {
    /// The level directly below this one.
    pub fn child(self) -> Option<Level> {
        match self {
            Level::Country => Some(Level::Region),
            Level::Region => Some(Level::Subregion),
            Level::Subregion => Some(Level::Subsubregion),
            Level::Subsubregion => None,
        }
    }

    /// The JSON key holding this level's children.
    fn children_key(self) -> Option<&'static str> {
        match self {
            Level::Country => Some("regions"),
            Level::Region => Some("subregions"),
            Level::Subregion => Some("subsubregions"),
            Level::Subsubregion => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Country => "country",
            Level::Region => "region",
            Level::Subregion => "subregion",
            Level::Subsubregion => "subsubregion",
        };
        write!(f, "{}", s)
    }
}

/// A node name, possibly declared with the alias syntax `"Base |Suffix"`.
///
/// Both `"Base"` and `"Base Suffix"` match; the canonical form is always the full one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeName {
    canonical: String,
    canonical_key: String,
    base_key: Option<String>,
}

impl NodeName {
    /// Parses a raw taxonomy key.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('|') {
            Some((base, suffix)) => {
                let base = base.trim();
                let suffix = suffix.trim();
                let canonical = if suffix.is_empty() {
                    base.to_string()
                } else {
                    format!("{} {}", base, suffix)
                };
                Self {
                    canonical_key: normalize_key(&canonical),
                    base_key: Some(normalize_key(base)),
                    canonical,
                }
            }
            None => {
                let canonical = raw.trim().to_string();
                Self {
                    canonical_key: normalize_key(&canonical),
                    base_key: None,
                    canonical,
                }
            }
        }
    }

    /// The display form of this name.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Returns true if an already-normalized key refers to this node.
    pub fn matches_key(&self, key: &str) -> bool {
        self.canonical_key == key || self.base_key.as_deref() == Some(key)
    }
}

/// One node of the taxonomy tree.
#[derive(Debug, Clone)]
pub struct TaxonomyNode {
    pub name: NodeName,
    pub level: Level,
    pub hints: Hints,
    /// Display abbreviation, only meaningful on countries.
    pub code: Option<String>,
    pub children: Vec<TaxonomyNode>,
}

impl TaxonomyNode {
    fn leaf(raw_name: &str, level: Level) -> Self {
        Self {
            name: NodeName::parse(raw_name),
            level,
            hints: Hints::new(),
            code: None,
            children: Vec::new(),
        }
    }
}

/// The read-only country > region > subregion > subsubregion hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    countries: Vec<TaxonomyNode>,
}

impl Taxonomy {
    /// Builds a taxonomy from an already-parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self, TaxonomyError> {
        let obj = value
            .as_object()
            .ok_or_else(|| TaxonomyError::shape("$", "object keyed by country"))?;

        let mut countries = Vec::with_capacity(obj.len());
        for (name, node) in obj {
            countries.push(parse_node(name, node, Level::Country, &format!("$.{}", name))?);
        }
        Ok(Self { countries })
    }

    /// Parses a taxonomy from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, TaxonomyError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Reads and parses a taxonomy JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TaxonomyError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// All countries in document order.
    pub fn countries(&self) -> &[TaxonomyNode] {
        &self.countries
    }

    /// Looks up a country by name, using the same normalization as region matching.
    pub fn country(&self, name: &str) -> Option<&TaxonomyNode> {
        let key = normalize_key(name);
        if key.is_empty() {
            return None;
        }
        self.countries.iter().find(|c| c.name.matches_key(&key))
    }

    /// Returns the display abbreviation for a country, falling back to the given name.
    pub fn country_code<'a>(&'a self, name: &'a str) -> &'a str {
        self.country(name)
            .and_then(|c| c.code.as_deref())
            .unwrap_or(name)
    }

    /// Number of countries.
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    /// Returns true if the taxonomy has no countries.
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

fn parse_node(
    raw_name: &str,
    value: &Value,
    level: Level,
    path: &str,
) -> Result<TaxonomyNode, TaxonomyError> {
    let mut node = TaxonomyNode::leaf(raw_name, level);

    let obj = match value {
        Value::Object(obj) => obj,
        Value::Null => return Ok(node),
        _ => return Err(TaxonomyError::shape(path, format!("{} object", level))),
    };

    if let Some(hints) = obj.get("hints") {
        node.hints = hints
            .as_object()
            .cloned()
            .ok_or_else(|| TaxonomyError::shape(format!("{}.hints", path), "object"))?;
    }

    if level == Level::Country {
        if let Some(code) = obj.get("code") {
            let code = code
                .as_str()
                .ok_or_else(|| TaxonomyError::shape(format!("{}.code", path), "string"))?;
            node.code = Some(code.to_string());
        }
    }

    let (Some(key), Some(child_level)) = (level.children_key(), level.child()) else {
        return Ok(node);
    };
    let Some(children) = obj.get(key) else {
        return Ok(node);
    };
    let child_path = format!("{}.{}", path, key);

    node.children = match (child_level, children) {
        (_, Value::Null) => Vec::new(),
        (Level::Subsubregion, Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str()
                    .map(|s| TaxonomyNode::leaf(s, Level::Subsubregion))
                    .ok_or_else(|| TaxonomyError::shape(format!("{}[{}]", child_path, i), "string"))
            })
            .collect::<Result<_, _>>()?,
        (Level::Subsubregion, _) => {
            return Err(TaxonomyError::shape(child_path, "array of strings"));
        }
        (_, Value::Object(map)) => map
            .iter()
            .map(|(name, v)| parse_node(name, v, child_level, &format!("{}.{}", child_path, name)))
            .collect::<Result<_, _>>()?,
        _ => return Err(TaxonomyError::shape(child_path, "object")),
    };

    Ok(node)
}

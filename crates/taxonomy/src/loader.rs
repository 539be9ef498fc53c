// ABOUTME: Loader for the reference datasets compiled into the binary.
// ABOUTME: Provides load_builtin_taxonomy() and load_builtin_varietals().

//! Embedded reference data.
//!
//! Both datasets live under `data/` and are embedded at compile time so a
//! scraper works without any files on disk. Callers that maintain their own
//! data load it with [`Taxonomy::from_path`] and [`VarietalList::from_path`].

use crate::tree::Taxonomy;
use crate::varietal::VarietalList;

/// Embedded region taxonomy.
const BUILTIN_TAXONOMY_JSON: &str = include_str!("../data/regions.json");

/// Embedded master grape list.
const BUILTIN_VARIETALS_JSON: &str = include_str!("../data/varietals.json");

/// Loads the builtin region taxonomy.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed.
pub fn load_builtin_taxonomy() -> Taxonomy {
    Taxonomy::from_json_str(BUILTIN_TAXONOMY_JSON).expect("failed to parse builtin taxonomy")
}

/// Loads the builtin master varietal list.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed.
pub fn load_builtin_varietals() -> VarietalList {
    VarietalList::from_json_str(BUILTIN_VARIETALS_JSON).expect("failed to parse builtin varietals")
}

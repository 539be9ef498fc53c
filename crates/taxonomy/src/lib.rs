// ABOUTME: Library entry point for the wine region taxonomy and varietal canonicalizer.
// ABOUTME: Re-exports Taxonomy, MatchResult, VarietalList, the loaders, and TaxonomyError.

//! Wine reference data.
//!
//! This crate holds the read-only reference data a wine scraper needs: a
//! country > region > subregion > subsubregion taxonomy with per-node hints,
//! a matcher that resolves free-text region strings against it, and a
//! master varietal list that turns raw grape mentions into one canonical
//! comma-separated string.
//!
//! # Example
//!
//! ```
//! use wino_taxonomy::{load_builtin_taxonomy, load_builtin_varietals};
//!
//! let taxonomy = load_builtin_taxonomy();
//! let m = taxonomy.match_region("Pomerol", Some("France")).unwrap();
//! assert_eq!(m.display_path(), "Pomerol, Bordeaux, France");
//!
//! let varietals = load_builtin_varietals();
//! let blend = varietals.canonicalize(&["Cabernet Franc", "Merlot"], "Château Example", &m.hints);
//! assert_eq!(blend, "Merlot, Cabernet Franc");
//! ```

pub mod error;
pub mod loader;
pub mod matcher;
pub mod normalize;
pub mod tree;
pub mod varietal;

pub use crate::error::TaxonomyError;
pub use crate::loader::{load_builtin_taxonomy, load_builtin_varietals};
pub use crate::matcher::MatchResult;
pub use crate::normalize::{normalize_key, strip_region_suffixes};
pub use crate::tree::{Hints, Level, NodeName, Taxonomy, TaxonomyNode};
pub use crate::varietal::{split_varietal, VarietalList, UNKNOWN_VARIETAL};

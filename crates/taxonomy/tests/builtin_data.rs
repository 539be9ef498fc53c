// ABOUTME: Integration tests running the matcher and canonicalizer against the embedded datasets.
// ABOUTME: Covers the bank/style hints and regional naming overrides shipped with the crate.

use pretty_assertions::assert_eq;
use wino_taxonomy::{load_builtin_taxonomy, load_builtin_varietals, Hints, Taxonomy, VarietalList};

fn hints_for(tax: &Taxonomy, region: &str, country: &str) -> Hints {
    tax.match_region(region, Some(country))
        .map(|m| m.hints)
        .unwrap_or_default()
}

#[test]
fn napa_valley_ava_resolves_through_alias() {
    let tax = load_builtin_taxonomy();
    let m = tax.match_region("Napa Valley AVA", Some("United States")).unwrap();
    assert_eq!(m.region.as_deref(), Some("California"));
    assert_eq!(m.subregion.as_deref(), Some("Napa Valley"));
    assert_eq!(m.display_path(), "Napa Valley, California, United States");
}

#[test]
fn pauillac_is_left_bank() {
    let tax = load_builtin_taxonomy();
    let m = tax.match_region("Pauillac", Some("France")).unwrap();
    assert_eq!(m.hint_str("bordeaux_bank"), Some("left"));
    assert_eq!(m.display_path(), "Pauillac, Médoc, Bordeaux, France");
}

#[test]
fn pomerol_right_bank_orders_merlot_first() {
    let tax = load_builtin_taxonomy();
    let list = load_builtin_varietals();
    let hints = hints_for(&tax, "Pomerol", "France");
    let out = list.canonicalize(
        &["Cabernet Sauvignon", "Cabernet Franc", "Merlot"],
        "Château Example",
        &hints,
    );
    assert_eq!(out, "Merlot, Cabernet Franc, Cabernet Sauvignon");
}

#[test]
fn chateauneuf_follows_southern_rhone_order() {
    let tax = load_builtin_taxonomy();
    let list = load_builtin_varietals();
    let hints = hints_for(&tax, "Châteauneuf-du-Pape", "France");
    let out = list.canonicalize(&["Mourvèdre", "Syrah", "Grenache"], "Domaine Example", &hints);
    assert_eq!(out, "Grenache, Syrah, Mourvèdre");
}

#[test]
fn australian_syrah_becomes_shiraz() {
    let tax = load_builtin_taxonomy();
    let list = load_builtin_varietals();
    let hints = hints_for(&tax, "Barossa Valley", "Australia");
    assert_eq!(list.canonicalize(&["Syrah"], "Estate Red", &hints), "Shiraz");
}

#[test]
fn unmatched_region_keeps_country_hints() {
    let tax = load_builtin_taxonomy();
    let list = load_builtin_varietals();
    let hints = hints_for(&tax, "Somewhere Obscure", "Spain");
    assert_eq!(list.canonicalize(&["Grenache"], "Tinto", &hints), "Garnacha");
}

#[test]
fn custom_data_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let tax_path = dir.path().join("regions.json");
    let var_path = dir.path().join("varietals.json");
    std::fs::write(&tax_path, r#"{"Narnia": {"code": "NA", "regions": {"Cair Paravel": {}}}}"#).unwrap();
    std::fs::write(&var_path, r#"["Merlot"]"#).unwrap();

    let tax = Taxonomy::from_path(&tax_path).unwrap();
    assert_eq!(tax.country_code("Narnia"), "NA");
    assert!(tax.match_region("Cair Paravel", None).is_some());

    let list = VarietalList::from_path(&var_path).unwrap();
    assert_eq!(list.len(), 1);
}

#[test]
fn missing_file_is_io_error() {
    let err = Taxonomy::from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, wino_taxonomy::TaxonomyError::Io { .. }));
}

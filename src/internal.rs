use crate::{GffParams, Locus, LocusStore, Ontology};
use crate::utils;

//-----------------------------------------------------------------------------

// LocusStore utilities.

// Names of the genes in `maize_small.gff` in file order.
pub(crate) const MAIZE_GENES: [&str; 4] = ["GRMZM2G059865", "GRMZM5G888250", "GRMZM2G093344", "GRMZM2G093399"];

// Returns an in-memory store with the maize test data and genes as the primary loci.
pub(crate) fn load_maize_store() -> LocusStore {
    let mut store = LocusStore::in_memory().unwrap();
    let filename = utils::get_test_data("maize_small.gff");
    let result = store.import_gff_file(&filename, &GffParams::default());
    assert!(result.is_ok(), "Failed to import {}: {}", filename.display(), result.unwrap_err());
    let result = store.set_primary_feature_type("gene", true);
    assert!(result.is_ok(), "Failed to set primary feature type: {}", result.unwrap_err());
    store
}

pub(crate) fn get_by_name(store: &LocusStore, name: &str) -> Locus {
    let locus = store.get(name);
    assert!(locus.is_ok(), "Failed to get locus {}: {}", name, locus.unwrap_err());
    locus.unwrap()
}

// Returns the names of the loci, using "None" for unnamed loci.
pub(crate) fn names<I: IntoIterator<Item = crate::Result<Locus>>>(loci: I) -> Vec<String> {
    loci.into_iter().map(|locus| {
        let locus = locus.unwrap();
        String::from(locus.name().unwrap_or("None"))
    }).collect()
}

//-----------------------------------------------------------------------------

// Ontology utilities.

// Returns an ontology built from the OBO test data over the maize store.
pub(crate) fn load_small_ontology() -> Ontology {
    let store = load_maize_store();
    let obo = utils::open_file(utils::get_test_data("small.obo")).unwrap();
    let terms = utils::open_file(utils::get_test_data("small_terms.tsv")).unwrap();
    let ontology = Ontology::from_obo(store, "small", obo, terms, &Default::default());
    assert!(ontology.is_ok(), "Failed to build the ontology: {}", ontology.unwrap_err());
    ontology.unwrap()
}

//-----------------------------------------------------------------------------

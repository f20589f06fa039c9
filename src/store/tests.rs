use super::*;

use crate::internal::{self, MAIZE_GENES};

use rand::Rng;

use std::panic::{self, AssertUnwindSafe};

//-----------------------------------------------------------------------------

fn gene_with_exons() -> Locus {
    let exon1 = Locus::new("1", 100, 150).unwrap()
        .with_feature_type("exon")
        .with_name("e1")
        .with_attr("rank", 1);
    let exon2 = Locus::new("1", 180, 200).unwrap()
        .with_feature_type("exon")
        .with_frame(Some(2))
        .with_attr("rank", 2);
    Locus::new("1", 100, 200).unwrap()
        .with_source("test")
        .with_feature_type("gene")
        .with_name("g1")
        .with_attr("biotype", "protein_coding")
        .with_attr("score", 0.25)
        .with_attr("curated", true)
        .with_sublocus(exon1)
        .with_sublocus(exon2)
}

fn within_names(store: &LocusStore, query: &Locus, params: &WithinQuery) -> Vec<String> {
    let result = store.within(query, params);
    assert!(result.is_ok(), "Failed to query loci within {}: {}", query, result.unwrap_err());
    internal::names(result.unwrap())
}

fn gene_names(indexes: &[usize]) -> Vec<String> {
    indexes.iter().map(|&i| String::from(MAIZE_GENES[i])).collect()
}

//-----------------------------------------------------------------------------

// Spatial index.

#[test]
fn bins() {
    assert_eq!(bin_for(0, 0), BIN_OFFSETS[0], "Wrong bin for the first position");
    assert_eq!(bin_for(0, (1 << FIRST_SHIFT) - 1), BIN_OFFSETS[0], "Wrong bin for the first smallest bin");
    assert_eq!(bin_for(1 << FIRST_SHIFT, 1 << FIRST_SHIFT), BIN_OFFSETS[0] + 1, "Wrong bin for the second smallest bin");
    assert_eq!(bin_for((1 << FIRST_SHIFT) - 1, 1 << FIRST_SHIFT), BIN_OFFSETS[1], "Wrong bin for a boundary-crossing interval");
    assert_eq!(bin_for(0, MAX_POSITION - 1), 1, "Wrong bin for the widest interval");
    assert_eq!(bin_for(0, MAX_POSITION), 0, "Wrong bin for a too long interval");
    assert_eq!(bin_for(-5, 10), 0, "Wrong bin for a negative interval");

    let ranges = bin_ranges(100, 200);
    assert_eq!(ranges.len(), BIN_OFFSETS.len() + 1, "Wrong number of bin ranges");
    assert_eq!(ranges[0], (0, 0), "Bin 0 should always be included");
    for (level, &offset) in BIN_OFFSETS.iter().enumerate() {
        assert_eq!(ranges[level + 1], (offset, offset), "Wrong bin range on level {}", level);
    }
}

#[test]
fn bins_cover_overlaps() {
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let start = rng.gen_range(-1000..MAX_POSITION + 1000);
        let end = start + rng.gen_range(0..1_000_000);
        let query_start = rng.gen_range(-1000..MAX_POSITION + 1000);
        let query_end = query_start + rng.gen_range(0..100_000);
        if start > query_end || end < query_start {
            continue;
        }
        let bin = bin_for(start, end);
        let found = bin_ranges(query_start, query_end).iter().any(|&(low, high)| bin >= low && bin <= high);
        assert!(found, "Bin {} of [{}, {}] not scanned for query [{}, {}]", bin, start, end, query_start, query_end);
    }
}

//-----------------------------------------------------------------------------

// Creating and opening stores.

#[test]
fn empty_store() {
    let store = LocusStore::in_memory().unwrap();
    assert_eq!(store.version(), LocusStore::VERSION, "Wrong version");
    assert_eq!(store.filename(), None, "In-memory store should not have a filename");
    assert_eq!(store.len().unwrap(), 0, "Empty store should not have primary loci");
    assert!(store.is_empty().unwrap(), "Empty store is not empty");
    assert_eq!(store.total_loci().unwrap(), 0, "Empty store should not have loci");
    assert_eq!(store.iter().unwrap().count(), 0, "Empty store should not iterate over loci");
    assert_eq!(store.primary_selection(), &PrimarySelection::default(), "Wrong default primary selection");
    assert!(store.feature_type_counts().unwrap().is_empty(), "Empty store should not have feature types");
}

#[test]
fn file_store() {
    let dir = tempfile::tempdir().unwrap();
    let filename = dir.path().join("loci.db");

    let mut store = LocusStore::create(&filename).unwrap();
    assert!(store.filename().is_some(), "File store should have a filename");
    let lid = store.add_locus(&gene_with_exons()).unwrap();
    store.set_primary_feature_type("exon", true).unwrap();
    drop(store);

    let duplicate = LocusStore::create(&filename);
    assert!(matches!(duplicate, Err(LocusError::AlreadyExists(_))), "Created a store over an existing file");

    let store = LocusStore::open(&filename);
    assert!(store.is_ok(), "Failed to open the store: {}", store.unwrap_err());
    let store = store.unwrap();
    assert!(store.file_size().is_some(), "File store should have a size");
    assert_eq!(
        store.primary_selection(), &PrimarySelection::FeatureTypes(vec![String::from("exon")]),
        "Primary selection was not stored"
    );
    assert_eq!(store.len().unwrap(), 2, "Wrong number of primary loci after reopening");
    assert_eq!(store.get_locus_by_lid(lid).unwrap(), gene_with_exons(), "Wrong locus after reopening");
}

#[test]
fn version_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let filename = dir.path().join("old.db");
    drop(LocusStore::create(&filename).unwrap());

    let connection = Connection::open(&filename).unwrap();
    connection.execute("UPDATE Tags SET value = 'Locus-base v0.0.1' WHERE key = 'version'", ()).unwrap();
    drop(connection);

    let store = LocusStore::open(&filename);
    match store {
        Err(LocusError::Version { found, expected }) => {
            assert_eq!(found, "Locus-base v0.0.1", "Wrong found version");
            assert_eq!(expected, LocusStore::VERSION, "Wrong expected version");
        },
        Err(err) => panic!("Wrong error for an old store: {}", err),
        Ok(_) => panic!("Opened a store with the wrong version"),
    }
}

#[test]
fn primary_selection_tags() {
    let selections = [
        PrimarySelection::default(),
        PrimarySelection::FeatureTypes(vec![String::from("gene"), String::from("CDS")]),
        PrimarySelection::Lids(vec![3, 1, 4]),
        PrimarySelection::Lids(Vec::new()),
    ];
    for selection in selections.iter() {
        let parsed = PrimarySelection::from_tag(&selection.to_tag());
        assert!(parsed.is_ok(), "Failed to parse {:?}: {}", selection, parsed.unwrap_err());
        assert_eq!(&parsed.unwrap(), selection, "Wrong primary selection from the tag");
    }
    assert!(PrimarySelection::from_tag("lid\tx").is_err(), "Parsed an invalid LID");
    assert!(PrimarySelection::from_tag("name\tgene").is_err(), "Parsed an invalid selection type");
}

//-----------------------------------------------------------------------------

// Inserting and finding loci.

#[test]
fn insert_and_lookup() {
    let mut store = LocusStore::in_memory().unwrap();
    let gene = gene_with_exons();
    let lid = store.add_locus(&gene);
    assert!(lid.is_ok(), "Failed to insert a locus: {}", lid.unwrap_err());
    let lid = lid.unwrap();
    assert_eq!(store.total_loci().unwrap(), 3, "Sub-loci were not inserted");

    let stored = store.get_locus_by_lid(lid).unwrap();
    assert_eq!(stored, gene, "Wrong locus by LID");
    assert_eq!(stored.lid(), Some(lid), "Wrong LID in the stored locus");
    assert_eq!(stored.name(), Some("g1"), "Wrong name in the stored locus");
    assert_eq!(stored.source(), "test", "Wrong source in the stored locus");
    assert_eq!(stored.attr("score"), Some(&AttrValue::Float(0.25)), "Wrong float attribute");
    assert_eq!(stored.attr("curated"), Some(&AttrValue::Bool(true)), "Wrong boolean attribute");
    assert_eq!(stored.subloci()[1].frame(), Some(2), "Wrong frame in a sub-locus");
    assert_eq!(stored.subloci()[0].lid(), Some(lid + 1), "Wrong LID for the first sub-locus");

    assert_eq!(store.get_lid_by_name("g1").unwrap(), lid, "Wrong LID by name");
    assert_eq!(store.get_lid_by_name("e1").unwrap(), lid + 1, "Wrong LID for a sub-locus by name");
    assert_eq!(store.get("g1").unwrap(), gene, "Wrong locus by name");
    assert!(matches!(store.get_lid_by_name("g2"), Err(LocusError::MissingLocus(_))), "Found a missing name");
    assert!(matches!(store.get_locus_by_lid(lid + 100), Err(LocusError::MissingLocus(_))), "Found a missing LID");

    let renamed = gene.clone().with_name("other");
    assert_eq!(store.get_lid(&renamed).unwrap(), lid, "Name should not affect lookup by content");
    assert!(store.contains(&gene).unwrap(), "Store does not contain the locus");
    assert!(store.contains_name("e1").unwrap(), "Store does not contain the sub-locus name");
    assert!(!store.contains_name("e3").unwrap(), "Store contains a missing name");

    let changed = gene.clone().with_attr("biotype", "pseudogene");
    assert!(!store.contains(&changed).unwrap(), "Attributes should affect lookup by content");
    let moved = Locus::new("1", 101, 200).unwrap().with_feature_type("gene");
    assert!(matches!(store.get_lid(&moved), Err(LocusError::MissingLocus(_))), "Found a missing locus by content");
}

#[test]
fn unnamed_duplicates() {
    let mut store = LocusStore::in_memory().unwrap();
    let snp = Locus::new("2", 500, 500).unwrap().with_feature_type("snp");
    let lids = store.add_loci(&[snp.clone(), snp.clone(), snp.clone().with_attr("allele", "A")]).unwrap();
    assert_eq!(lids.len(), 3, "Wrong number of LIDs");
    assert_eq!(store.get_lid(&snp).unwrap(), lids[0], "Lookup by content should return the lowest LID");
    assert_eq!(
        store.get_lid(&snp.clone().with_attr("allele", "A")).unwrap(), lids[2],
        "Lookup by content should resolve collisions with equality"
    );
    assert_eq!(store.lids_by_feature_type("snp").unwrap(), lids, "Wrong LIDs by feature type");
}

#[test]
fn maize_import() {
    let mut store = LocusStore::in_memory().unwrap();
    let stats = store.import_gff_file(utils::get_test_data("maize_small.gff"), &GffParams::default());
    assert!(stats.is_ok(), "Failed to import GFF: {}", stats.unwrap_err());
    let expected = ImportStats { total: 20, top_level: 4, inserted: 20, failed: 0, skipped: 0 };
    assert_eq!(stats.unwrap(), expected, "Wrong import statistics");
    assert_eq!(store.total_loci().unwrap(), 20, "Wrong total number of loci");

    let counts = store.feature_type_counts().unwrap();
    let counts: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    assert_eq!(counts, vec![("CDS", 5), ("exon", 7), ("gene", 4), ("mRNA", 4)], "Wrong feature type counts");

    let gene = internal::get_by_name(&store, "GRMZM2G093399");
    assert_eq!(gene.descendants(), 5, "Wrong number of descendants");
    assert_eq!(
        gene.as_tree(),
        "gene:GRMZM2G093399\n  mRNA:GRMZM2G093399_T01\n    exon:None\n    exon:None\n    CDS:None\n    CDS:None\n",
        "Wrong hierarchy"
    );
    let cds = &gene.subloci()[0].subloci()[2];
    assert_eq!(cds.attr("score"), Some(&AttrValue::Float(0.5)), "Wrong score for a CDS");
    assert_eq!(cds.frame(), Some(0), "Wrong frame for a CDS");
    assert_eq!(cds.attr("Name"), Some(&AttrValue::from("GRMZM2G093399_P01")), "Wrong Name attribute");

    let transcript = internal::get_by_name(&store, "GRMZM2G093399_T01");
    assert_eq!(transcript.feature_type(), "mRNA", "Wrong feature type for a transcript");
    assert_eq!(store.parent_of(transcript.lid().unwrap()).unwrap(), gene.lid(), "Wrong parent for a transcript");
}

#[test]
fn gzipped_import() {
    let mut store = LocusStore::in_memory().unwrap();
    let stats = store.import_gff_file(utils::get_test_data("maize_small.gff.gz"), &GffParams::default());
    assert!(stats.is_ok(), "Failed to import gzipped GFF: {}", stats.unwrap_err());
    assert_eq!(stats.unwrap().inserted, 20, "Wrong number of loci from a gzipped file");
    store.set_primary_feature_type("gene", true).unwrap();
    assert_eq!(internal::names(store.iter().unwrap()), gene_names(&[0, 1, 2, 3]), "Wrong genes from a gzipped file");
}

#[test]
fn malformed_import() {
    let mut store = LocusStore::in_memory().unwrap();
    let params = GffParams {
        skip_feature_types: vec![String::from("chromosome")],
        infer_types: true,
        ..GffParams::default()
    };
    let stats = store.import_gff_file(utils::get_test_data("bad.gff"), &params);
    assert!(stats.is_ok(), "Failed to import GFF with bad lines: {}", stats.unwrap_err());
    let expected = ImportStats { total: 9, top_level: 2, inserted: 3, failed: 5, skipped: 1 };
    assert_eq!(stats.unwrap(), expected, "Wrong import statistics");

    let g1 = internal::get_by_name(&store, "g1");
    assert_eq!(g1.descendants(), 1, "Rows with bad children should not be attached");
    let g3 = internal::get_by_name(&store, "g3");
    assert_eq!(g3.attr("copies"), Some(&AttrValue::Int(2)), "Integer attribute was not inferred");
    assert_eq!(g3.attr("curated"), Some(&AttrValue::Bool(true)), "Boolean attribute was not inferred");
    assert_eq!(g3.attr("score"), Some(&AttrValue::Float(12.5)), "Wrong score");
    assert!(!store.contains_name("g2").unwrap(), "Row with an invalid strand was imported");
}

#[test]
fn gff_round_trip() {
    let store = internal::load_maize_store();
    let mut buffer: Vec<u8> = Vec::new();
    let result = store.write_gff(&mut buffer);
    assert!(result.is_ok(), "Failed to write GFF: {}", result.unwrap_err());
    assert_eq!(buffer.iter().filter(|&&c| c == b'\n').count(), 20, "Wrong number of GFF lines");

    let mut copy = LocusStore::in_memory().unwrap();
    let stats = copy.import_gff(buffer.as_slice(), &GffParams::default()).unwrap();
    assert_eq!(stats.inserted, 20, "Wrong number of loci after a round trip");
    assert_eq!(copy.feature_type_counts().unwrap(), store.feature_type_counts().unwrap(), "Wrong feature types after a round trip");
    for name in MAIZE_GENES.iter() {
        let original = internal::get_by_name(&store, name);
        let copied = internal::get_by_name(&copy, name);
        assert_eq!(copied.as_tree(), original.as_tree(), "Wrong hierarchy for {} after a round trip", name);
        assert_eq!(copied.content_hash(), original.content_hash(), "Wrong content hash for {} after a round trip", name);
    }
}

//-----------------------------------------------------------------------------

// Attributes and relationships.

#[test]
fn attribute_updates() {
    let mut store = internal::load_maize_store();
    let lid = store.get_lid_by_name(MAIZE_GENES[0]).unwrap();

    store.set_attr(lid, "curated", true).unwrap();
    assert_eq!(store.get_locus_by_lid(lid).unwrap().attr("curated"), Some(&AttrValue::Bool(true)), "Attribute was not inserted");
    store.set_attr(lid, "curated", "partially").unwrap();
    assert_eq!(store.get_locus_by_lid(lid).unwrap().attr("curated"), Some(&AttrValue::from("partially")), "Attribute was not replaced");
    store.set_attr(lid, "biotype", "lncRNA").unwrap();
    assert_eq!(store.get_locus_by_lid(lid).unwrap().attr("biotype"), Some(&AttrValue::from("lncRNA")), "Existing attribute was not replaced");

    let missing = store.set_attr(1000, "curated", true);
    assert!(matches!(missing, Err(LocusError::MissingLocus(_))), "Set an attribute for a missing locus");
}

#[test]
fn relationships() {
    let mut store = internal::load_maize_store();
    let gene1 = store.get_lid_by_name(MAIZE_GENES[0]).unwrap();
    let transcript1 = store.get_lid_by_name("GRMZM2G059865_T01").unwrap();
    let transcript2 = store.get_lid_by_name("GRMZM5G888250_T01").unwrap();
    assert_eq!(store.parent_of(gene1).unwrap(), None, "Gene should not have a parent");
    assert_eq!(store.parent_of(transcript1).unwrap(), Some(gene1), "Wrong parent for a transcript");
    let children = store.children_of(transcript1).unwrap();
    assert_eq!(children.len(), 3, "Wrong number of children for a transcript");

    // Move the CDS to the other transcript.
    let cds = children[2];
    let result = store.reparent(cds, Some(transcript2));
    assert!(result.is_ok(), "Failed to reparent a locus: {}", result.unwrap_err());
    assert_eq!(store.parent_of(cds).unwrap(), Some(transcript2), "Wrong parent after reparenting");
    assert_eq!(store.children_of(transcript1).unwrap(), children[0..2].to_vec(), "Wrong children for the old parent");
    assert_eq!(store.children_of(transcript2).unwrap().last(), Some(&cds), "New child should be the last one");

    // Content hashes were updated for both hierarchies.
    for name in MAIZE_GENES[0..2].iter() {
        let gene = internal::get_by_name(&store, name);
        assert_eq!(store.get_lid(&gene).unwrap(), gene.lid().unwrap(), "Content lookup failed for {} after reparenting", name);
    }

    // Detach the transcript.
    store.reparent(transcript1, None).unwrap();
    assert_eq!(store.parent_of(transcript1).unwrap(), None, "Detached locus should not have a parent");
    assert!(store.get_locus_by_lid(gene1).unwrap().subloci().is_empty(), "Gene should not have sub-loci");

    // Cycles.
    let exon = store.children_of(transcript2).unwrap()[0];
    let gene2 = store.parent_of(transcript2).unwrap().unwrap();
    assert!(matches!(store.reparent(gene2, Some(exon)), Err(LocusError::Cycle { .. })), "Created a cycle");
    assert!(matches!(store.reparent(gene2, Some(gene2)), Err(LocusError::Cycle { .. })), "Created a self-loop");
    assert!(matches!(store.reparent(gene2, Some(1000)), Err(LocusError::MissingLocus(_))), "Reparented under a missing locus");
    assert_eq!(store.children_of(gene2).unwrap(), vec![transcript2], "Failed reparenting changed the hierarchy");
}

#[test]
fn remove_everything() {
    let mut store = internal::load_maize_store();
    store.remove_all().unwrap();
    assert_eq!(store.total_loci().unwrap(), 0, "Loci were not removed");
    assert!(store.is_empty().unwrap(), "Primary loci were not removed");
    assert!(!store.contains_name(MAIZE_GENES[0]).unwrap(), "Found a removed locus");

    let lid = store.add_locus(&Locus::new("1", 1, 2).unwrap().with_feature_type("gene")).unwrap();
    assert!(lid > 20, "LID {} was reused", lid);
    assert_eq!(store.len().unwrap(), 1, "Wrong number of primary loci after removal");
}

//-----------------------------------------------------------------------------

// Primary loci.

#[test]
fn primary_loci() {
    let mut store = internal::load_maize_store();
    assert_eq!(store.len().unwrap(), 4, "Wrong number of genes");
    assert_eq!(internal::names(store.iter().unwrap()), gene_names(&[0, 1, 2, 3]), "Wrong genes");

    store.set_primary_feature_type("CDS", true).unwrap();
    assert_eq!(store.len().unwrap(), 5, "Wrong number of CDS loci");
    store.set_primary_feature_type("gene", false).unwrap();
    assert_eq!(store.len().unwrap(), 9, "Wrong number of loci with two feature types");
    assert_eq!(
        store.primary_selection(),
        &PrimarySelection::FeatureTypes(vec![String::from("CDS"), String::from("gene")]),
        "Wrong primary selection"
    );

    let genes = store.lids_by_feature_type("gene").unwrap();
    store.set_primary_lids(&genes[0..2]).unwrap();
    assert_eq!(store.primary_lids().unwrap(), genes[0..2].to_vec(), "Wrong primary LIDs");
    store.set_primary_feature_type("mRNA", false).unwrap();
    assert_eq!(store.len().unwrap(), 6, "Wrong number of loci after adding a feature type to LIDs");

    let missing = store.set_primary_lids(&[1000]);
    assert!(matches!(missing, Err(LocusError::MissingLocus(_))), "Set a missing LID as primary");
    assert_eq!(store.len().unwrap(), 6, "Failed update changed the primary loci");

    // New loci become primary when their feature type is selected.
    store.set_primary_feature_type("gene", true).unwrap();
    store.add_locus(&Locus::new("2", 100, 200).unwrap().with_feature_type("gene")).unwrap();
    assert_eq!(store.len().unwrap(), 5, "New gene did not become primary");
}

#[test]
fn scoped_primary() {
    let mut store = internal::load_maize_store();
    {
        let scope = store.scoped_primary_feature_type("CDS", true).unwrap();
        assert_eq!(scope.len().unwrap(), 5, "Wrong number of primary loci in the scope");
        let found = scope.within(&Locus::new("1", 136000, 138000).unwrap(), &WithinQuery::default()).unwrap();
        assert_eq!(found.len(), 2, "Wrong number of CDS loci within the gene");
    }
    assert_eq!(store.len().unwrap(), 4, "Primary loci were not restored");
    assert_eq!(
        store.primary_selection(), &PrimarySelection::FeatureTypes(vec![String::from("gene")]),
        "Primary selection was not restored"
    );

    let failed: Result<usize> = store.with_primary_feature_type("exon", |scope| {
        assert_eq!(scope.len()?, 7, "Wrong number of exons");
        Err(LocusError::Configuration(String::from("failure")))
    });
    assert!(failed.is_err(), "Error was not passed through");
    assert_eq!(store.len().unwrap(), 4, "Primary loci were not restored after an error");

    let exons = store.with_primary_feature_type("exon", |scope| scope.len()).unwrap();
    assert_eq!(exons, 7, "Wrong result from the closure");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let scope = store.scoped_primary_feature_type("mRNA", true).unwrap();
        assert_eq!(scope.len().unwrap(), 4, "Wrong number of transcripts");
        panic!("Panic inside the scope");
    }));
    assert!(result.is_err(), "The scope should have panicked");
    assert_eq!(store.len().unwrap(), 4, "Primary loci were not restored after a panic");
    assert_eq!(store.lids_by_feature_type("gene").unwrap(), store.primary_lids().unwrap(), "Wrong primary loci after a panic");
}

#[test]
fn scoped_primary_restores_stored_selection() {
    let dir = tempfile::tempdir().unwrap();
    let filename = dir.path().join("loci.db");
    let genes = PrimarySelection::FeatureTypes(vec![String::from("gene")]);
    {
        let mut store = LocusStore::create(&filename).unwrap();
        let stats = store.import_gff_file(utils::get_test_data("maize_small.gff"), &GffParams::default());
        assert!(stats.is_ok(), "Failed to import loci: {}", stats.unwrap_err());
        store.set_primary_feature_type("gene", true).unwrap();

        let result = store.with_primary_feature_type("exon", |scope| scope.set_primary_feature_type("CDS", true));
        assert!(result.is_ok(), "Failed to set the selection in the scope: {}", result.unwrap_err());
        assert_eq!(store.primary_selection(), &genes, "Selection in memory was not restored");
        assert_eq!(store.len().unwrap(), 4, "Wrong number of primary loci after the scope");
    }

    let store = LocusStore::open(&filename).unwrap();
    assert_eq!(store.primary_selection(), &genes, "Stored selection was not restored");
    assert_eq!(store.len().unwrap(), 4, "Wrong number of primary loci after reopening");
}

#[test]
fn random_sampling() {
    let store = internal::load_maize_store();
    let primary = store.primary_lids().unwrap();

    let mut sample = store.rand(4, true).unwrap();
    sample.sort_unstable();
    assert_eq!(sample, primary, "Distinct sample of all loci should contain every locus");
    assert!(matches!(store.rand(5, true), Err(LocusError::Capacity { requested: 5, available: 4 })), "Sampled too many distinct loci");

    let sample = store.rand(10, false).unwrap();
    assert_eq!(sample.len(), 10, "Wrong sample size with replacement");
    assert!(sample.iter().all(|lid| primary.contains(lid)), "Sample contains non-primary loci");

    let locus = store.rand_one().unwrap();
    assert_eq!(locus.feature_type(), "gene", "Random locus is not primary");

    let empty = LocusStore::in_memory().unwrap();
    assert!(matches!(empty.rand_one(), Err(LocusError::Capacity { .. })), "Sampled from an empty store");
    assert!(empty.rand(0, true).unwrap().is_empty(), "Empty sample should be allowed");
}

//-----------------------------------------------------------------------------

// Range queries.

#[test]
fn within_strand_order() {
    let mut store = LocusStore::in_memory().unwrap();
    for start in [30, 10, 40, 20] {
        let locus = Locus::new("1", start, start + 5).unwrap().with_name(start.to_string());
        store.add_locus(&locus).unwrap();
    }
    store.add_locus(&Locus::new("2", 10, 15).unwrap()).unwrap();

    let forward = Locus::new("1", 1, 50).unwrap();
    let reverse = forward.clone().with_strand(Strand::Reverse);
    let unknown = forward.clone().with_strand(Strand::Unknown);
    let params = WithinQuery::default();
    assert_eq!(within_names(&store, &forward, &params), vec!["10", "20", "30", "40"], "Wrong order on the + strand");
    assert_eq!(within_names(&store, &reverse, &params), vec!["40", "30", "20", "10"], "Wrong order on the - strand");

    let ignore = WithinQuery::default().with_ignore_strand(true);
    assert_eq!(within_names(&store, &reverse, &ignore), vec!["10", "20", "30", "40"], "Strand was not ignored");
    assert_eq!(within_names(&store, &unknown, &ignore), vec!["10", "20", "30", "40"], "Unknown strand was not ignored");
    assert!(matches!(store.within(&unknown, &params), Err(LocusError::Strand(_))), "Ordered loci without a strand");

    let both = WithinQuery::default().with_ignore_strand(true).with_same_strand(true);
    assert!(matches!(store.within(&forward, &both), Err(LocusError::Configuration(_))), "Accepted mutually exclusive options");
}

#[test]
fn within_partial() {
    let store = internal::load_maize_store();
    let query = Locus::new("1", 6000, 137000).unwrap();
    let full = within_names(&store, &query, &WithinQuery::default());
    assert_eq!(full, gene_names(&[1, 2]), "Wrong genes fully within the window");
    let partial = within_names(&store, &query, &WithinQuery::default().with_partial(true));
    assert_eq!(partial, gene_names(&[0, 1, 2, 3]), "Wrong genes partially within the window");

    // Touching endpoints do not count.
    let touching = Locus::new("1", 9652, 9882).unwrap();
    assert!(within_names(&store, &touching, &WithinQuery::default().with_partial(true)).is_empty(), "Touching genes overlap");
    let exact = Locus::new("1", 9882, 10387).unwrap();
    assert!(within_names(&store, &exact, &WithinQuery::default()).is_empty(), "Identical interval is strictly within");

    let other = Locus::new("2", 1, 1_000_000).unwrap();
    assert!(within_names(&store, &other, &WithinQuery::default()).is_empty(), "Found genes on the wrong chromosome");
}

#[test]
fn within_same_strand() {
    let store = internal::load_maize_store();
    let forward = Locus::new("1", 1, 139000).unwrap();
    let reverse = forward.clone().with_strand(Strand::Reverse);
    let params = WithinQuery::default().with_same_strand(true);
    assert_eq!(within_names(&store, &forward, &WithinQuery::default()).len(), 4, "Wrong number of genes without a strand filter");
    assert_eq!(within_names(&store, &forward, &params), gene_names(&[3]), "Wrong genes on the + strand");
    assert_eq!(within_names(&store, &reverse, &params), gene_names(&[2, 1, 0]), "Wrong genes on the - strand");
}

#[test]
fn upstream_and_downstream() {
    let store = internal::load_maize_store();

    let last = internal::get_by_name(&store, MAIZE_GENES[3]);
    let up = store.upstream_loci(&last, &NeighborQuery::default().with_n(3)).unwrap();
    assert_eq!(internal::names(up), gene_names(&[2, 1, 0]), "Wrong genes upstream on the + strand");

    let second = internal::get_by_name(&store, MAIZE_GENES[1]);
    let up = store.upstream_loci(&second, &NeighborQuery::default().with_n(2)).unwrap();
    assert_eq!(internal::names(up), gene_names(&[2, 3]), "Wrong genes upstream on the - strand");
    let down = store.downstream_loci(&second, &NeighborQuery::default()).unwrap();
    assert_eq!(internal::names(down), gene_names(&[0]), "Wrong genes downstream on the - strand");

    let query = Locus::new("1", 4854, 9652).unwrap();
    let down = store.downstream_loci(&query, &NeighborQuery::default().with_n(3)).unwrap();
    assert_eq!(internal::names(down), gene_names(&[1, 2, 3]), "Wrong genes downstream on the + strand");
    let same = NeighborQuery::default().with_n(1).with_same_strand(true);
    let down = store.downstream_loci(&query, &same).unwrap();
    assert_eq!(internal::names(down), gene_names(&[3]), "Wrong genes downstream on the same strand");

    let unknown = query.clone().with_strand(Strand::Unknown);
    assert!(matches!(store.upstream_loci(&unknown, &NeighborQuery::default()), Err(LocusError::Strand(_))), "Upstream without a strand");
}

#[test]
fn neighbor_distance() {
    let store = internal::load_maize_store();
    let query = Locus::new("1", 4854, 9652).unwrap();

    let near = NeighborQuery::default().with_max_distance(1000);
    let down = store.downstream_loci(&query, &near).unwrap();
    assert_eq!(internal::names(down), gene_names(&[1]), "Wrong genes within 1000 bp");

    let short = NeighborQuery::default().with_max_distance(500);
    assert_eq!(store.downstream_loci(&query, &short).unwrap().len(), 0, "Found a gene extending beyond the window");
    let down = store.downstream_loci(&query, &short.with_partial(true)).unwrap();
    assert_eq!(internal::names(down), gene_names(&[1]), "Wrong genes partially within 500 bp");

    let up = store.upstream_loci(&query, &NeighborQuery::default()).unwrap();
    assert_eq!(up.len(), 0, "Found genes upstream of the first gene");
}

#[test]
fn neighbors_exclude_self() {
    let store = internal::load_maize_store();
    for locus in store.iter().unwrap() {
        let locus = locus.unwrap();
        let lid = locus.lid().unwrap();
        for partial in [false, true] {
            let params = NeighborQuery::default().with_partial(partial);
            let (up, down) = store.flanking_loci(&locus, &params).unwrap();
            assert!(!up.into_lids().contains(&lid), "Locus {} is upstream of itself (partial = {})", lid, partial);
            assert!(!down.into_lids().contains(&lid), "Locus {} is downstream of itself (partial = {})", lid, partial);
        }
    }
}

#[test]
fn flanking_and_encompassing() {
    let store = internal::load_maize_store();
    let point = Locus::new("1", 10500, 10500).unwrap();
    let (up, down) = store.flanking_loci(&point, &NeighborQuery::default().with_n(2)).unwrap();
    assert_eq!(internal::names(up), gene_names(&[1, 0]), "Wrong flanking genes upstream");
    assert_eq!(internal::names(down), gene_names(&[2, 3]), "Wrong flanking genes downstream");

    let inside = Locus::new("1", 10000, 10000).unwrap();
    let found = store.encompassing_loci(&inside).unwrap();
    assert_eq!(internal::names(found), gene_names(&[1]), "Wrong encompassing genes");
    let boundary = Locus::new("1", 9882, 9900).unwrap();
    assert_eq!(store.encompassing_loci(&boundary).unwrap().len(), 0, "Genes sharing an endpoint do not encompass");

    let mut store = store;
    store.set_primary_feature_type("mRNA", false).unwrap();
    let found = store.encompassing_loci(&inside).unwrap();
    assert_eq!(found.len(), 2, "Transcripts should also encompass the position");
}

//-----------------------------------------------------------------------------

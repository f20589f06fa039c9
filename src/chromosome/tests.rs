use super::*;

//-----------------------------------------------------------------------------

#[test]
fn construction() {
    let symbols = [Nucleotide::A, Nucleotide::a, Nucleotide::C, Nucleotide::G, Nucleotide::T, Nucleotide::U, Nucleotide::N, Nucleotide::n];
    let from_symbols = Chromosome::from_symbols("chr1", &symbols);
    let from_string = Chromosome::new("chr1", "AaCGTUNn");
    assert!(from_string.is_ok(), "Failed to create a chromosome: {}", from_string.unwrap_err());
    let from_string = from_string.unwrap();
    assert_eq!(from_string, from_symbols, "String and symbol construction produced different chromosomes");
    assert_eq!(from_string.sequence(), from_symbols.sequence(), "Different sequence bytes");
    assert_eq!(from_string.len(), symbols.len(), "Wrong length");

    let invalid = Chromosome::new("chr1", "ACGX");
    assert!(matches!(invalid, Err(LocusError::Symbol('X'))), "Accepted an invalid symbol");

    let empty = Chromosome::new("empty", "").unwrap();
    assert!(empty.is_empty(), "Empty chromosome is not empty");
}

#[test]
fn equality() {
    let a = Chromosome::new("chr1", "ACGT").unwrap();
    let b = Chromosome::new("chr1", "ACGT").unwrap().with_attrs(vec![String::from("x")]);
    let c = Chromosome::new("chr2", "ACGT").unwrap();
    let d = Chromosome::new("chr1", "ACGA").unwrap();
    assert_eq!(a, b, "Attributes should not affect equality");
    assert_ne!(a, c, "Name should affect equality");
    assert_ne!(a, d, "Sequence should affect equality");
}

#[test]
fn positions() {
    let chromosome = Chromosome::new("chr1", "AAACCCTTTGGG").unwrap();
    assert_eq!(chromosome.get(1).unwrap(), 'A', "Wrong first symbol");
    assert_eq!(chromosome.get(4).unwrap(), 'C', "Wrong symbol at position 4");
    assert_eq!(chromosome.get(12).unwrap(), 'G', "Wrong last symbol");
    assert!(matches!(chromosome.get(0), Err(LocusError::Coordinate(_))), "Accepted position 0");
    assert!(matches!(chromosome.get(-3), Err(LocusError::Coordinate(_))), "Accepted a negative position");
    assert!(matches!(chromosome.get(13), Err(LocusError::Coordinate(_))), "Accepted a position past the end");
}

#[test]
fn ranges() {
    let chromosome = Chromosome::new("chr1", "AAACCCTTTGGG").unwrap();
    assert_eq!(chromosome.get_range(1, 5).unwrap(), "AAACC", "Wrong prefix");
    assert_eq!(chromosome.get_range(5, 10).unwrap(), "CCTTTG", "Wrong infix");
    assert_eq!(chromosome.get_range(4, 4).unwrap(), "C", "Wrong single-base range");
    assert_eq!(chromosome.get_range(10, 100).unwrap(), "GGG", "End should be clamped");
    assert_eq!(chromosome.get_range(9, 100).unwrap(), "TGGG", "End should be clamped after the last T");
    assert_eq!(chromosome.get_range(8, 5).unwrap(), "", "Reversed range should be empty");
    assert!(matches!(chromosome.get_range(0, 5), Err(LocusError::Coordinate(_))), "Accepted start 0");
}

#[test]
fn display() {
    let short = Chromosome::new("chr1", "ACGT").unwrap();
    assert_eq!(short.to_string(), "Chromosome(chr1, ACGT)", "Wrong short representation");
    let long = Chromosome::new("chr2", &"A".repeat(100)).unwrap();
    assert_eq!(long.to_string(), format!("Chromosome(chr2, {}...)", "A".repeat(30)), "Wrong long representation");
}

//-----------------------------------------------------------------------------

#[test]
fn fasta_from_file() {
    let filename = utils::get_test_data("small.fa");
    let fasta = Fasta::from_file(&filename, None);
    assert!(fasta.is_ok(), "Failed to read FASTA: {}", fasta.unwrap_err());
    let fasta = fasta.unwrap();
    assert_eq!(fasta.len(), 3, "Wrong number of chromosomes");
    assert_eq!(fasta.filename(), Some(filename.as_path()), "Wrong filename");

    let names: Vec<&str> = fasta.iter().map(|x| x.name()).collect();
    assert_eq!(names, vec!["chr1", "chr2", "chr3"], "Wrong chromosome order");

    let chr1 = fasta.get("chr1").unwrap();
    assert_eq!(chr1.len(), 64, "Wrong length for chr1");
    assert_eq!(chr1.attrs(), &[String::from("assembly=test"), String::from("length=64")], "Wrong attributes for chr1");
    assert_eq!(chr1.get_range(61, 64).unwrap(), "NNNN", "Wrong suffix for chr1");
    assert_eq!(fasta.get("chr2").unwrap().get_range(17, 24).unwrap(), "UUUUnnnn", "Wrong suffix for chr2");
    assert_eq!(fasta.get("chr3").unwrap().len(), 4, "Wrong length for chr3");
    assert!(matches!(fasta.get("chr4"), Err(LocusError::MissingChromosome(_))), "Found a missing chromosome");
}

#[test]
fn fasta_nicknames() {
    let filename = utils::get_test_data("small.fa");
    let pattern = Regex::new(r"^chr(\d+).*$").unwrap();
    let fasta = Fasta::from_file(&filename, Some((&pattern, "$1"))).unwrap();
    assert!(fasta.contains("1"), "Missing nickname 1");
    assert!(fasta.contains("chr1"), "Missing original name");
    assert_eq!(fasta.get("2").unwrap().name(), "chr2", "Nickname resolves to the wrong chromosome");
    assert!(!fasta.contains("4"), "Found a nickname for a missing chromosome");
}

#[test]
fn fasta_editing() {
    let mut fasta = Fasta::new();
    assert!(fasta.is_empty(), "New collection is not empty");
    fasta.add_chrom(Chromosome::new("added", &"U".repeat(100)).unwrap(), false).unwrap();
    assert_eq!(fasta.get("added").unwrap().len(), 100, "Wrong length for the added chromosome");

    let duplicate = fasta.add_chrom(Chromosome::new("added", "U").unwrap(), false);
    assert!(matches!(duplicate, Err(LocusError::AlreadyExists(_))), "Added a duplicate chromosome");
    fasta.add_chrom(Chromosome::new("added", &"U".repeat(200)).unwrap(), true).unwrap();
    assert_eq!(fasta.get("added").unwrap().len(), 200, "Chromosome was not replaced");
    assert_eq!(fasta.len(), 1, "Replacing changed the number of chromosomes");

    fasta.add_nickname("nick", "added").unwrap();
    assert!(fasta.add_nickname("other", "missing").is_err(), "Added a nickname for a missing chromosome");
    let removed = fasta.remove_chrom("added").unwrap();
    assert_eq!(removed.len(), 200, "Removed the wrong chromosome");
    assert!(!fasta.contains("added"), "Chromosome was not removed");
    assert!(!fasta.contains("nick"), "Nickname was not removed");
    assert!(fasta.remove_chrom("added").is_err(), "Removed a missing chromosome");
}

//-----------------------------------------------------------------------------

//! # Locus-base: genomic intervals with strand-aware range queries stored in SQLite.
//!
//! This is a library for storing genomic loci (genes, transcripts, exons, SNPs, and similar features) in a SQLite database.
//! It is intended for analyses that repeatedly ask positional questions about a large annotation set:
//! which loci fall inside a region, which loci lie upstream or downstream of a feature, or which terms are enriched for a set of genes.
//!
//! See [`Locus`] for the interval type and [`LocusStore`] for the database interface.
//! See [`Term`] and [`Ontology`] for sets of loci and enrichment analysis.
//! See [`Chromosome`] and [`Fasta`] for reference sequences.
//!
//! ### Basic concepts
//!
//! Coordinates are 1-based and inclusive.
//! Each locus has a strand, and positional queries are relative to the strand of the query locus:
//! upstream of a reverse-strand gene is at higher coordinates.
//!
//! Each stored locus is identified by a locus identifier (LID), which is the primary key in table `Loci`.
//! Sub-loci are stored as separate rows linked to their parents in table `Relationships`.
//! Queries return primary loci (see below), and each locus is returned with its sub-loci.
//!
//! The store has a primary selection that determines which loci are visible to iteration and queries.
//! By default, loci with feature type `locus` are primary.
//! The selection can be changed persistently with [`LocusStore::set_primary`] or temporarily with [`LocusStore::scoped_primary_feature_type`].
//!
//! Range queries use a hierarchical binning index in table `Positions`.
//! Each locus is assigned to the smallest bin that contains it, and a query scans the bins overlapping the query interval on each level.
//!
//! ### Ontologies
//!
//! An [`Ontology`] shares the database with its [`LocusStore`].
//! Terms are stored in table `Terms`, and they refer to the loci by LID.
//! Ontologies can be built from OBO files and locus-term maps, and they support hypergeometric enrichment tests.

mod error;

pub mod chromosome;
pub mod formats;
pub mod locus;
pub mod ontology;
pub mod store;
pub mod term;
pub mod utils;

#[cfg(test)]
mod internal;

pub use error::{LocusError, Result};
pub use chromosome::{Chromosome, Fasta, Nucleotide};
pub use locus::{AttrValue, Attributes, Locus, Strand};
pub use ontology::{Enrichment, EnrichmentParams, Ontology};
pub use store::{GffParams, ImportStats, LocusIter, LocusStore, NeighborQuery, PrimaryScope, PrimarySelection, WithinQuery};
pub use term::Term;

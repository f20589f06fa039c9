//! Errors reported by the library.

use thiserror::Error;

//-----------------------------------------------------------------------------

/// An error in constructing, storing, or querying loci.
///
/// Data and usage errors are reported at the point of violation and are never retried.
/// Errors from the underlying SQLite database and from file I/O are passed through.
#[derive(Debug, Error)]
pub enum LocusError {
    /// The start of an interval is after its end.
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: i64, end: i64 },

    /// An operation requires a concrete strand (`+` or `-`).
    #[error("Bad strand: {0}")]
    Strand(String),

    /// An operation requires two loci on the same chromosome.
    #[error("Chromosomes do not match: {0} and {1}")]
    ChromosomeMismatch(String, String),

    /// A lookup by LID, name, or content hash found no match.
    #[error("Locus not present in the store: {0}")]
    MissingLocus(String),

    /// Mutually exclusive options were used together.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Random sampling requested more distinct items than exist.
    #[error("Requested {requested} loci, but only {available} are available")]
    Capacity { requested: usize, available: usize },

    /// A sequence coordinate is outside the valid range.
    #[error("Invalid coordinate: {0}")]
    Coordinate(String),

    /// A sequence contains a symbol outside the nucleotide alphabet.
    #[error("Invalid nucleotide symbol: {0:?}")]
    Symbol(char),

    /// A chromosome is not present in a FASTA collection.
    #[error("Chromosome not present: {0}")]
    MissingChromosome(String),

    /// A locus lacks an attribute required by the operation.
    #[error("Missing attribute: {0}")]
    MissingAttribute(String),

    /// Re-parenting would create a cycle in the sub-locus forest.
    #[error("Locus {child} cannot become a child of its descendant {parent}")]
    Cycle { child: usize, parent: usize },

    /// A term is not present in the ontology.
    #[error("Term not present in the ontology: {0}")]
    MissingTerm(String),

    /// A database file does not have the expected version.
    #[error("Unsupported database version: {found} (expected {expected})")]
    Version { found: String, expected: String },

    /// A database file already exists.
    #[error("Database {0} already exists")]
    AlreadyExists(String),

    /// A database row cannot be decoded.
    #[error("Invalid data in the database: {0}")]
    InvalidData(String),

    /// A malformed line in an input file.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Passed through from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Passed through from file I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`](std::result::Result) type for this crate.
pub type Result<T> = std::result::Result<T, LocusError>;

//-----------------------------------------------------------------------------

//! LocusStore: a SQLite database of genomic loci with strand-aware range queries.
//!
//! Loci are stored in five tables:
//!
//! * `Tags` contains the database version and the primary selection.
//! * `Loci` contains the core fields of each locus, indexed by name, content hash, and feature type.
//! * `Attributes` contains the typed annotations, one row per key.
//! * `Relationships` links each sub-locus to its parent; a locus has at most one parent.
//! * `Positions` is the spatial index.
//!
//! The spatial index assigns each interval to the smallest bin that contains it in a hierarchy of bins.
//! The smallest bins cover 16 kbp, each level is 8 times coarser, and the top-level bin covers 512 Mbp.
//! Intervals that do not fit in the hierarchy are assigned to bin 0.
//! An overlap query scans a contiguous range of bins on each level and filters the candidates by position.

use crate::{AttrValue, Attributes, Locus, LocusError, Result, Strand};
use crate::formats::{self, GffRecord};
use crate::utils;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;

use log::{debug, info, warn};

use once_cell::unsync::OnceCell;

use rand::Rng;
use rand::seq::SliceRandom;

use rusqlite::{Connection, OptionalExtension, Transaction};

mod query;

pub use query::{LocusIter, NeighborQuery, WithinQuery};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

// Shift for the smallest bins in the spatial index.
const FIRST_SHIFT: usize = 14;

// Shift between consecutive levels of bins.
const NEXT_SHIFT: usize = 3;

// Offsets of the bins on each level, from the smallest bins to the top-level bin.
const BIN_OFFSETS: [i64; 6] = [4682, 586, 74, 10, 2, 1];

// Intervals ending at or after this position go to bin 0.
const MAX_POSITION: i64 = 1 << 29;

// Returns the smallest bin containing the interval.
fn bin_for(start: i64, end: i64) -> i64 {
    if start < 0 || end >= MAX_POSITION {
        return 0;
    }
    let mut start = start >> FIRST_SHIFT;
    let mut end = end >> FIRST_SHIFT;
    for offset in BIN_OFFSETS {
        if start == end {
            return offset + start;
        }
        start >>= NEXT_SHIFT;
        end >>= NEXT_SHIFT;
    }
    0
}

// Returns the ranges of bins that may contain intervals overlapping the query.
fn bin_ranges(start: i64, end: i64) -> Vec<(i64, i64)> {
    let mut result = vec![(0, 0)];
    let mut start = start.clamp(0, MAX_POSITION - 1) >> FIRST_SHIFT;
    let mut end = end.clamp(0, MAX_POSITION - 1) >> FIRST_SHIFT;
    for offset in BIN_OFFSETS {
        result.push((offset + start, offset + end));
        start >>= NEXT_SHIFT;
        end >>= NEXT_SHIFT;
    }
    result
}

// A locus found in the spatial index.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Candidate {
    lid: usize,
    start: i64,
    end: i64,
    strand: Strand,
}

fn parse_strand(value: &str) -> Result<Strand> {
    value.parse::<Strand>().map_err(|_| LocusError::InvalidData(format!("Invalid strand {}", value)))
}

//-----------------------------------------------------------------------------

/// The loci iterated over and queried by default.
///
/// The selection is either a list of feature types or an explicit list of LIDs.
/// The default selection is the feature type [`Locus::DEFAULT_FEATURE_TYPE`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrimarySelection {
    /// All loci with one of the given feature types.
    FeatureTypes(Vec<String>),
    /// The given loci.
    Lids(Vec<usize>),
}

impl PrimarySelection {
    const FEATURE_TYPES: &'static str = "type";
    const LIDS: &'static str = "lid";

    fn to_tag(&self) -> String {
        let mut fields: Vec<String> = Vec::new();
        match self {
            PrimarySelection::FeatureTypes(types) => {
                fields.push(String::from(Self::FEATURE_TYPES));
                fields.extend(types.iter().cloned());
            },
            PrimarySelection::Lids(lids) => {
                fields.push(String::from(Self::LIDS));
                fields.extend(lids.iter().map(|lid| lid.to_string()));
            },
        }
        fields.join("\t")
    }

    fn from_tag(value: &str) -> Result<Self> {
        let mut fields = value.split('\t');
        match fields.next() {
            Some(Self::FEATURE_TYPES) => Ok(PrimarySelection::FeatureTypes(fields.map(String::from).collect())),
            Some(Self::LIDS) => {
                let lids = fields.map(|field| field.parse::<usize>()).collect::<std::result::Result<Vec<_>, _>>();
                lids.map(PrimarySelection::Lids).map_err(|err| {
                    LocusError::InvalidData(format!("Invalid primary LID list: {}", err))
                })
            },
            _ => Err(LocusError::InvalidData(format!("Invalid primary selection: {}", value))),
        }
    }
}

impl Default for PrimarySelection {
    fn default() -> Self {
        PrimarySelection::FeatureTypes(vec![String::from(Locus::DEFAULT_FEATURE_TYPE)])
    }
}

// Cached primary loci.
#[derive(Clone, Debug, Default)]
struct PrimarySet {
    // In ascending order.
    lids: Vec<usize>,
    members: HashSet<usize>,
}

impl PrimarySet {
    fn new(mut lids: Vec<usize>) -> Self {
        lids.sort_unstable();
        lids.dedup();
        let members = lids.iter().copied().collect();
        PrimarySet { lids, members }
    }
}

//-----------------------------------------------------------------------------

/// Parameters for importing GFF/GTF files into a [`LocusStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GffParams {
    /// Attribute used as the name of a locus.
    pub id_attr: String,

    /// Attribute naming the parent of a locus.
    pub parent_attr: String,

    /// Separator between the key and the value of an attribute (`=` in GFF, space in GTF).
    pub attr_split: String,

    /// Records with these feature types are skipped.
    pub skip_feature_types: Vec<String>,

    /// Infer integer, float, and boolean attribute values instead of storing all values as strings.
    pub infer_types: bool,
}

impl GffParams {
    /// Default name attribute.
    pub const ID_ATTR: &'static str = "ID";

    /// Default parent attribute.
    pub const PARENT_ATTR: &'static str = Locus::PARENT_ATTR;

    /// Default attribute separator.
    pub const ATTR_SPLIT: &'static str = "=";

    /// Parameters for GTF files: name from `gene_id`, no parents, space-separated attributes.
    pub fn gtf() -> Self {
        GffParams {
            id_attr: String::from("gene_id"),
            parent_attr: String::from("Parent"),
            attr_split: String::from(" "),
            ..Self::default()
        }
    }
}

impl Default for GffParams {
    fn default() -> Self {
        GffParams {
            id_attr: String::from(Self::ID_ATTR),
            parent_attr: String::from(Self::PARENT_ATTR),
            attr_split: String::from(Self::ATTR_SPLIT),
            skip_feature_types: Vec::new(),
            infer_types: false,
        }
    }
}

/// Statistics from importing a GFF file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Number of non-comment lines.
    pub total: usize,
    /// Number of inserted loci without a parent.
    pub top_level: usize,
    /// Number of inserted loci, including sub-loci.
    pub inserted: usize,
    /// Number of malformed lines and records with a missing parent.
    pub failed: usize,
    /// Number of records with a skipped feature type.
    pub skipped: usize,
}

// A record during import.
struct ImportNode {
    locus: Option<Locus>,
    children: Vec<usize>,
}

//-----------------------------------------------------------------------------

/// A collection of loci stored in a SQLite database.
///
/// The store assigns each inserted locus a stable integer identifier (LID).
/// Sub-loci are inserted recursively with their own LIDs.
/// A subset of the loci, determined by the [`PrimarySelection`], is iterated over and queried by default.
/// The primary loci are cached in memory, and every mutation clears the cache.
///
/// A store is either backed by a file or entirely in memory.
/// Each thread should have its own store.
///
/// # Examples
///
/// ```
/// use locus_base::{Locus, LocusStore, NeighborQuery, Strand};
///
/// let mut store = LocusStore::in_memory().unwrap();
/// let gene = Locus::new("1", 1000, 2000).unwrap()
///     .with_name("a")
///     .with_sublocus(Locus::new("1", 1000, 1200).unwrap().with_feature_type("exon"));
/// let lid = store.add_locus(&gene).unwrap();
/// store.add_locus(&Locus::new("1", 3000, 4000).unwrap().with_name("b")).unwrap();
///
/// // Sub-loci are stored but they are not primary.
/// assert_eq!(store.total_loci().unwrap(), 3);
/// assert_eq!(store.len().unwrap(), 2);
/// assert_eq!(store.get_locus_by_lid(lid).unwrap(), gene);
///
/// // Find the nearest locus downstream of the first one.
/// let query = NeighborQuery::default().with_n(1);
/// let found: Vec<Locus> = store.downstream_loci(&gene, &query).unwrap().map(|x| x.unwrap()).collect();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].name(), Some("b"));
/// ```
#[derive(Debug)]
pub struct LocusStore {
    connection: Connection,
    version: String,
    primary: PrimarySelection,
    primary_cache: OnceCell<PrimarySet>,
}

/// Opening and creating the database.
impl LocusStore {
    // Key for database version.
    const KEY_VERSION: &'static str = "version";

    /// Current database version.
    pub const VERSION: &'static str = "Locus-base v0.1.0";

    // Key for the primary selection.
    const KEY_PRIMARY: &'static str = "primary";

    const SCHEMA: [&'static str; 10] = [
        "CREATE TABLE Tags (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        ) STRICT",
        "CREATE TABLE Loci (
            lid INTEGER PRIMARY KEY AUTOINCREMENT,
            chromosome TEXT NOT NULL,
            start INTEGER NOT NULL,
            end INTEGER NOT NULL,
            source TEXT NOT NULL,
            feature_type TEXT NOT NULL,
            strand TEXT NOT NULL,
            frame INTEGER,
            name TEXT,
            hash INTEGER NOT NULL
        ) STRICT",
        "CREATE INDEX LociName ON Loci(name)",
        "CREATE INDEX LociHash ON Loci(hash)",
        "CREATE INDEX LociFeatureType ON Loci(feature_type)",
        "CREATE TABLE Attributes (
            lid INTEGER NOT NULL REFERENCES Loci(lid),
            key TEXT NOT NULL,
            kind TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (lid, key)
        ) STRICT",
        "CREATE TABLE Relationships (
            child INTEGER PRIMARY KEY REFERENCES Loci(lid),
            parent INTEGER NOT NULL REFERENCES Loci(lid),
            rank INTEGER NOT NULL
        ) STRICT",
        "CREATE INDEX RelationshipsParent ON Relationships(parent, rank)",
        "CREATE TABLE Positions (
            lid INTEGER PRIMARY KEY REFERENCES Loci(lid),
            chromosome TEXT NOT NULL,
            bin INTEGER NOT NULL,
            start INTEGER NOT NULL,
            end INTEGER NOT NULL
        ) STRICT",
        "CREATE INDEX PositionsBin ON Positions(chromosome, bin, start)",
    ];

    /// Returns a new empty store in memory.
    ///
    /// Passes through any database errors.
    pub fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize(connection)
    }

    /// Opens the store in the given file, creating an empty store if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not a database of the current version.
    /// Passes through any database errors.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let exists = utils::file_exists(&filename);
        let connection = Connection::open(&filename)?;
        if exists {
            Self::load(connection)
        } else {
            info!("Creating database {}", filename.as_ref().display());
            Self::initialize(connection)
        }
    }

    /// Creates a new empty store in the given file.
    ///
    /// Returns an error if the file already exists.
    /// Passes through any database errors.
    pub fn create<P: AsRef<Path>>(filename: P) -> Result<Self> {
        if utils::file_exists(&filename) {
            return Err(LocusError::AlreadyExists(filename.as_ref().display().to_string()));
        }
        Self::open(filename)
    }

    fn initialize(mut connection: Connection) -> Result<Self> {
        connection.pragma_update(None, "foreign_keys", true)?;
        let primary = PrimarySelection::default();
        let transaction = connection.transaction()?;
        for statement in Self::SCHEMA.iter() {
            transaction.execute(statement, ())?;
        }
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Tags(key, value) VALUES (?1, ?2)"
            )?;
            insert.execute((Self::KEY_VERSION, Self::VERSION))?;
            insert.execute((Self::KEY_PRIMARY, primary.to_tag()))?;
        }
        transaction.commit()?;

        Ok(LocusStore {
            connection,
            version: String::from(Self::VERSION),
            primary,
            primary_cache: OnceCell::new(),
        })
    }

    fn load(connection: Connection) -> Result<Self> {
        connection.pragma_update(None, "foreign_keys", true)?;
        let mut tags: HashMap<String, String> = HashMap::new();
        {
            let mut get_tags = connection.prepare("SELECT key, value FROM Tags")?;
            let mut rows = get_tags.query(())?;
            while let Some(row) = rows.next()? {
                tags.insert(row.get(0)?, row.get(1)?);
            }
        }

        let version = tags.get(Self::KEY_VERSION).cloned().unwrap_or_default();
        if version != Self::VERSION {
            return Err(LocusError::Version { found: version, expected: String::from(Self::VERSION) });
        }
        let primary = match tags.get(Self::KEY_PRIMARY) {
            Some(value) => PrimarySelection::from_tag(value)?,
            None => PrimarySelection::default(),
        };

        Ok(LocusStore {
            connection,
            version,
            primary,
            primary_cache: OnceCell::new(),
        })
    }

    /// Returns the filename of the database, or [`None`] if the store is in memory.
    pub fn filename(&self) -> Option<&str> {
        self.connection.path().filter(|path| !path.is_empty())
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        let filename = self.filename()?;
        utils::file_size(filename)
    }

    /// Returns the version of the database.
    pub fn version(&self) -> &str {
        &self.version
    }

    // The connection is shared with ontologies built on top of the store.
    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }

    // Runs the closure in a transaction and clears the primary cache if the transaction was committed.
    pub(crate) fn mutate<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T>,
    {
        let transaction = self.connection.transaction()?;
        let result = f(&transaction)?;
        transaction.commit()?;
        self.primary_cache.take();
        Ok(result)
    }
}

//-----------------------------------------------------------------------------

/// Reading and writing loci.
impl LocusStore {
    // Inserts the locus and its sub-loci recursively.
    pub(crate) fn insert_locus(connection: &Connection, locus: &Locus) -> Result<usize> {
        connection.prepare_cached(
            "INSERT INTO Loci(chromosome, start, end, source, feature_type, strand, frame, name, hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        )?.execute((
            locus.chromosome(), locus.start(), locus.end(),
            locus.source(), locus.feature_type(), locus.strand().as_str(),
            locus.frame(), locus.name(), locus.content_hash() as i64,
        ))?;
        let lid = connection.last_insert_rowid() as usize;

        {
            let mut insert_attr = connection.prepare_cached(
                "INSERT INTO Attributes(lid, key, kind, value) VALUES (?1, ?2, ?3, ?4)"
            )?;
            for (key, value) in locus.attrs().iter() {
                insert_attr.execute((lid, key, value.type_code().to_string(), value.to_string()))?;
            }
        }

        connection.prepare_cached(
            "INSERT INTO Positions(lid, chromosome, bin, start, end) VALUES (?1, ?2, ?3, ?4, ?5)"
        )?.execute((lid, locus.chromosome(), bin_for(locus.start(), locus.end()), locus.start(), locus.end()))?;

        for (rank, sublocus) in locus.subloci().iter().enumerate() {
            let child = Self::insert_locus(connection, sublocus)?;
            connection.prepare_cached(
                "INSERT INTO Relationships(child, parent, rank) VALUES (?1, ?2, ?3)"
            )?.execute((child, lid, rank))?;
        }

        Ok(lid)
    }

    // Reads the locus and its sub-loci recursively.
    fn load_locus(connection: &Connection, lid: usize) -> Result<Locus> {
        let row = connection.prepare_cached(
            "SELECT chromosome, start, end, source, feature_type, strand, frame, name FROM Loci WHERE lid = ?1"
        )?.query_row((lid,), |row| {
            let chromosome: String = row.get(0)?;
            let start: i64 = row.get(1)?;
            let end: i64 = row.get(2)?;
            let source: String = row.get(3)?;
            let feature_type: String = row.get(4)?;
            let strand: String = row.get(5)?;
            let frame: Option<u8> = row.get(6)?;
            let name: Option<String> = row.get(7)?;
            Ok((chromosome, start, end, source, feature_type, strand, frame, name))
        }).optional()?;
        let (chromosome, start, end, source, feature_type, strand, frame, name) = row.ok_or_else(|| {
            LocusError::MissingLocus(format!("LID {}", lid))
        })?;

        let mut locus = Locus::new(chromosome, start, end)?
            .with_source(source)
            .with_feature_type(feature_type)
            .with_strand(parse_strand(&strand)?)
            .with_frame(frame)
            .with_attrs(Self::load_attrs(connection, lid)?);
        if let Some(name) = name {
            locus = locus.with_name(name);
        }
        locus.set_lid(lid);
        for child in Self::child_lids(connection, lid)? {
            locus.subloci_mut().push(Self::load_locus(connection, child)?);
        }
        Ok(locus)
    }

    fn load_attrs(connection: &Connection, lid: usize) -> Result<Attributes> {
        let mut get_attrs = connection.prepare_cached(
            "SELECT key, kind, value FROM Attributes WHERE lid = ?1"
        )?;
        let mut rows = get_attrs.query((lid,))?;
        let mut attrs = Attributes::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let kind: String = row.get(1)?;
            let value: String = row.get(2)?;
            let type_code = kind.chars().next().unwrap_or_default();
            let value = AttrValue::from_parts(type_code, &value).map_err(LocusError::InvalidData)?;
            attrs.insert(key, value);
        }
        Ok(attrs)
    }

    fn child_lids(connection: &Connection, lid: usize) -> Result<Vec<usize>> {
        let mut get_children = connection.prepare_cached(
            "SELECT child FROM Relationships WHERE parent = ?1 ORDER BY rank"
        )?;
        let children = get_children.query_map((lid,), |row| row.get(0))?;
        let children = children.collect::<rusqlite::Result<Vec<usize>>>()?;
        Ok(children)
    }

    fn parent_lid(connection: &Connection, lid: usize) -> Result<Option<usize>> {
        let parent = connection.prepare_cached(
            "SELECT parent FROM Relationships WHERE child = ?1"
        )?.query_row((lid,), |row| row.get(0)).optional()?;
        Ok(parent)
    }

    fn require_lid(connection: &Connection, lid: usize) -> Result<()> {
        let found: Option<usize> = connection.prepare_cached(
            "SELECT lid FROM Loci WHERE lid = ?1"
        )?.query_row((lid,), |row| row.get(0)).optional()?;
        match found {
            Some(_) => Ok(()),
            None => Err(LocusError::MissingLocus(format!("LID {}", lid))),
        }
    }

    // Finds the lowest LID of a stored locus equal to the given one.
    pub(crate) fn find_lid(connection: &Connection, locus: &Locus) -> Result<Option<usize>> {
        let candidates: Vec<usize> = {
            let mut get_candidates = connection.prepare_cached(
                "SELECT lid FROM Loci WHERE hash = ?1 ORDER BY lid"
            )?;
            let rows = get_candidates.query_map((locus.content_hash() as i64,), |row| row.get(0))?;
            rows.collect::<rusqlite::Result<Vec<usize>>>()?
        };
        for lid in candidates {
            if Self::load_locus(connection, lid)? == *locus {
                return Ok(Some(lid));
            }
        }
        Ok(None)
    }

    // Recomputes the content hashes of the locus and its ancestors.
    fn refresh_hashes(connection: &Connection, lid: usize) -> Result<()> {
        let mut current = Some(lid);
        while let Some(lid) = current {
            let locus = Self::load_locus(connection, lid)?;
            connection.prepare_cached(
                "UPDATE Loci SET hash = ?2 WHERE lid = ?1"
            )?.execute((lid, locus.content_hash() as i64))?;
            current = Self::parent_lid(connection, lid)?;
        }
        Ok(())
    }

    /// Inserts the locus and its sub-loci into the store and returns the LID of the locus.
    ///
    /// Each sub-locus gets its own LID.
    /// The insertion is atomic.
    pub fn add_locus(&mut self, locus: &Locus) -> Result<usize> {
        self.mutate(|transaction| Self::insert_locus(transaction, locus))
    }

    /// Inserts the loci in a single transaction and returns their LIDs.
    pub fn add_loci(&mut self, loci: &[Locus]) -> Result<Vec<usize>> {
        let lids = self.mutate(|transaction| {
            loci.iter().map(|locus| Self::insert_locus(transaction, locus)).collect::<Result<Vec<_>>>()
        })?;
        info!("Inserted {} loci", lids.len());
        Ok(lids)
    }

    /// Returns the locus with the given LID, including its sub-loci.
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::MissingLocus`] if there is no such locus.
    pub fn get_locus_by_lid(&self, lid: usize) -> Result<Locus> {
        Self::load_locus(&self.connection, lid)
    }

    /// Returns the LID of a locus with the given name.
    ///
    /// If several loci share the name, returns the lowest LID.
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::MissingLocus`] if there is no such locus.
    pub fn get_lid_by_name(&self, name: &str) -> Result<usize> {
        let lid: Option<usize> = self.connection.prepare_cached(
            "SELECT lid FROM Loci WHERE name = ?1 ORDER BY lid LIMIT 1"
        )?.query_row((name,), |row| row.get(0)).optional()?;
        lid.ok_or_else(|| LocusError::MissingLocus(String::from(name)))
    }

    /// Returns the LID of a stored locus equal to the given locus.
    ///
    /// The lookup uses the content hash and resolves collisions with [`Locus`] equality.
    /// Names are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::MissingLocus`] if there is no such locus.
    pub fn get_lid(&self, locus: &Locus) -> Result<usize> {
        let lid = Self::find_lid(&self.connection, locus)?;
        lid.ok_or_else(|| LocusError::MissingLocus(locus.to_string()))
    }

    /// Returns the locus with the given name.
    ///
    /// See [`Self::get_lid_by_name`].
    pub fn get(&self, name: &str) -> Result<Locus> {
        let lid = self.get_lid_by_name(name)?;
        self.get_locus_by_lid(lid)
    }

    /// Returns `true` if the store contains a locus equal to the given locus.
    pub fn contains(&self, locus: &Locus) -> Result<bool> {
        match self.get_lid(locus) {
            Ok(_) => Ok(true),
            Err(LocusError::MissingLocus(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Returns `true` if the store contains a locus with the given name.
    pub fn contains_name(&self, name: &str) -> Result<bool> {
        match self.get_lid_by_name(name) {
            Ok(_) => Ok(true),
            Err(LocusError::MissingLocus(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Inserts or replaces an attribute of the locus with the given LID.
    ///
    /// Returns [`LocusError::MissingLocus`] if there is no such locus.
    pub fn set_attr<V: Into<AttrValue>>(&mut self, lid: usize, key: &str, value: V) -> Result<()> {
        let value: AttrValue = value.into();
        self.mutate(|transaction| {
            Self::require_lid(transaction, lid)?;
            transaction.prepare_cached(
                "INSERT INTO Attributes(lid, key, kind, value) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(lid, key) DO UPDATE SET kind = excluded.kind, value = excluded.value"
            )?.execute((lid, key, value.type_code().to_string(), value.to_string()))?;
            Ok(())
        })
    }

    /// Moves a locus under a new parent, or makes it a top-level locus if `parent` is [`None`].
    ///
    /// The locus becomes the last child of the new parent.
    /// The content hashes of the old and the new ancestors are updated.
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::MissingLocus`] if either locus does not exist.
    /// Returns [`LocusError::Cycle`] if the new parent is the locus itself or one of its descendants.
    pub fn reparent(&mut self, child: usize, parent: Option<usize>) -> Result<()> {
        self.mutate(|transaction| {
            Self::require_lid(transaction, child)?;
            if let Some(parent) = parent {
                Self::require_lid(transaction, parent)?;
                let mut current = Some(parent);
                while let Some(lid) = current {
                    if lid == child {
                        return Err(LocusError::Cycle { child, parent });
                    }
                    current = Self::parent_lid(transaction, lid)?;
                }
            }

            let old_parent = Self::parent_lid(transaction, child)?;
            transaction.prepare_cached(
                "DELETE FROM Relationships WHERE child = ?1"
            )?.execute((child,))?;
            if let Some(old_parent) = old_parent {
                Self::refresh_hashes(transaction, old_parent)?;
            }

            if let Some(parent) = parent {
                let rank: i64 = transaction.prepare_cached(
                    "SELECT COALESCE(MAX(rank) + 1, 0) FROM Relationships WHERE parent = ?1"
                )?.query_row((parent,), |row| row.get(0))?;
                transaction.prepare_cached(
                    "INSERT INTO Relationships(child, parent, rank) VALUES (?1, ?2, ?3)"
                )?.execute((child, parent, rank))?;
                Self::refresh_hashes(transaction, parent)?;
            }
            Ok(())
        })
    }

    /// Returns the LID of the parent of the locus, or [`None`] for a top-level locus.
    pub fn parent_of(&self, lid: usize) -> Result<Option<usize>> {
        Self::require_lid(&self.connection, lid)?;
        Self::parent_lid(&self.connection, lid)
    }

    /// Returns the LIDs of the sub-loci of the locus in order.
    pub fn children_of(&self, lid: usize) -> Result<Vec<usize>> {
        Self::require_lid(&self.connection, lid)?;
        Self::child_lids(&self.connection, lid)
    }

    /// Deletes all loci from the store.
    ///
    /// The primary selection is retained, and LIDs are not reused.
    pub fn remove_all(&mut self) -> Result<()> {
        self.mutate(|transaction| {
            for table in ["Relationships", "Attributes", "Positions", "Loci"] {
                transaction.execute(&format!("DELETE FROM {}", table), ())?;
            }
            Ok(())
        })?;
        info!("Removed all loci");
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// Statistics and iteration.
impl LocusStore {
    /// Returns the number of primary loci.
    pub fn len(&self) -> Result<usize> {
        Ok(self.primary_set()?.lids.len())
    }

    /// Returns `true` if there are no primary loci.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns the total number of loci, including sub-loci and other non-primary loci.
    pub fn total_loci(&self) -> Result<usize> {
        let count = self.connection.prepare_cached(
            "SELECT COUNT(*) FROM Loci"
        )?.query_row((), |row| row.get(0))?;
        Ok(count)
    }

    /// Returns the LIDs of the primary loci in ascending order.
    pub fn primary_lids(&self) -> Result<Vec<usize>> {
        Ok(self.primary_set()?.lids.clone())
    }

    /// Returns an iterator over the primary loci in LID order.
    pub fn iter(&self) -> Result<LocusIter<'_>> {
        Ok(LocusIter::new(self, self.primary_lids()?))
    }

    /// Returns the LIDs of all loci with the given feature type in ascending order.
    pub fn lids_by_feature_type(&self, feature_type: &str) -> Result<Vec<usize>> {
        let mut get_lids = self.connection.prepare_cached(
            "SELECT lid FROM Loci WHERE feature_type = ?1 ORDER BY lid"
        )?;
        let lids = get_lids.query_map((feature_type,), |row| row.get(0))?;
        let lids = lids.collect::<rusqlite::Result<Vec<usize>>>()?;
        Ok(lids)
    }

    /// Returns the number of loci of each feature type.
    pub fn feature_type_counts(&self) -> Result<BTreeMap<String, usize>> {
        let mut get_counts = self.connection.prepare_cached(
            "SELECT feature_type, COUNT(*) FROM Loci GROUP BY feature_type"
        )?;
        let mut rows = get_counts.query(())?;
        let mut result = BTreeMap::new();
        while let Some(row) = rows.next()? {
            result.insert(row.get(0)?, row.get(1)?);
        }
        Ok(result)
    }

    /// Returns `n` random primary LIDs.
    ///
    /// If `distinct` is true, the LIDs are sampled without replacement.
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Capacity`] if there are not enough primary loci.
    pub fn rand(&self, n: usize, distinct: bool) -> Result<Vec<usize>> {
        let lids = &self.primary_set()?.lids;
        if (distinct && n > lids.len()) || (n > 0 && lids.is_empty()) {
            return Err(LocusError::Capacity { requested: n, available: lids.len() });
        }
        let mut rng = rand::thread_rng();
        let result = if distinct {
            lids.choose_multiple(&mut rng, n).copied().collect()
        } else {
            (0..n).map(|_| lids[rng.gen_range(0..lids.len())]).collect()
        };
        Ok(result)
    }

    /// Returns a random primary locus.
    ///
    /// Returns [`LocusError::Capacity`] if there are no primary loci.
    pub fn rand_one(&self) -> Result<Locus> {
        let lids = self.rand(1, true)?;
        self.get_locus_by_lid(lids[0])
    }

    /// Writes the primary loci and their sub-loci in the GFF3 format.
    pub fn write_gff<W: Write>(&self, output: &mut W) -> Result<()> {
        for locus in self.iter()? {
            formats::write_gff_locus(&locus?, output)?;
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// Primary loci.
impl LocusStore {
    fn primary_set(&self) -> Result<&PrimarySet> {
        self.primary_cache.get_or_try_init(|| {
            let lids = match &self.primary {
                PrimarySelection::FeatureTypes(types) => {
                    let mut lids = Vec::new();
                    for feature_type in types.iter() {
                        lids.extend(self.lids_by_feature_type(feature_type)?);
                    }
                    lids
                },
                PrimarySelection::Lids(lids) => {
                    let mut existing = Vec::with_capacity(lids.len());
                    for &lid in lids.iter() {
                        match Self::require_lid(&self.connection, lid) {
                            Ok(()) => existing.push(lid),
                            Err(LocusError::MissingLocus(_)) => {},
                            Err(err) => return Err(err),
                        }
                    }
                    existing
                },
            };
            let set = PrimarySet::new(lids);
            debug!("Recomputed primary loci: {} loci", set.lids.len());
            Ok(set)
        })
    }

    /// Returns the current primary selection.
    pub fn primary_selection(&self) -> &PrimarySelection {
        &self.primary
    }

    /// Replaces the primary selection and stores it in the database.
    pub fn set_primary(&mut self, selection: PrimarySelection) -> Result<()> {
        self.store_primary_tag(&selection)?;
        info!("Primary loci: {:?}", selection);
        self.primary = selection;
        Ok(())
    }

    fn store_primary_tag(&mut self, selection: &PrimarySelection) -> Result<()> {
        let value = selection.to_tag();
        self.mutate(|transaction| {
            transaction.prepare_cached(
                "INSERT INTO Tags(key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value"
            )?.execute((Self::KEY_PRIMARY, value))?;
            Ok(())
        })
    }

    // Rewrites the stored selection if it was changed inside a scope.
    fn restore_primary_tag(&mut self, selection: &PrimarySelection) -> Result<()> {
        let stored: Option<String> = self.connection.prepare_cached(
            "SELECT value FROM Tags WHERE key = ?1"
        )?.query_row((Self::KEY_PRIMARY,), |row| row.get(0)).optional()?;
        if stored.as_deref() != Some(selection.to_tag().as_str()) {
            self.store_primary_tag(selection)?;
        }
        Ok(())
    }

    /// Makes loci with the given feature type primary.
    ///
    /// If `clear_previous` is true, the feature type replaces the current selection.
    /// Otherwise the loci are added to the current selection.
    pub fn set_primary_feature_type(&mut self, feature_type: &str, clear_previous: bool) -> Result<()> {
        let selection = self.extended_selection(feature_type, clear_previous)?;
        self.set_primary(selection)
    }

    /// Makes the given loci primary.
    ///
    /// Returns [`LocusError::MissingLocus`] if any of the loci does not exist.
    pub fn set_primary_lids(&mut self, lids: &[usize]) -> Result<()> {
        for &lid in lids.iter() {
            Self::require_lid(&self.connection, lid)?;
        }
        self.set_primary(PrimarySelection::Lids(lids.to_vec()))
    }

    fn extended_selection(&self, feature_type: &str, clear_previous: bool) -> Result<PrimarySelection> {
        if clear_previous {
            return Ok(PrimarySelection::FeatureTypes(vec![String::from(feature_type)]));
        }
        match &self.primary {
            PrimarySelection::FeatureTypes(types) => {
                let mut types = types.clone();
                if !types.iter().any(|x| x == feature_type) {
                    types.push(String::from(feature_type));
                }
                Ok(PrimarySelection::FeatureTypes(types))
            },
            PrimarySelection::Lids(lids) => {
                let mut lids = lids.clone();
                lids.extend(self.lids_by_feature_type(feature_type)?);
                lids.sort_unstable();
                lids.dedup();
                Ok(PrimarySelection::Lids(lids))
            },
        }
    }

    /// Temporarily makes loci with the given feature type primary.
    ///
    /// The previous selection is restored when the returned guard is dropped, even during a panic.
    /// The temporary selection is not stored in the database.
    /// If the selection is changed persistently through the guard, the stored selection is also restored.
    ///
    /// # Examples
    ///
    /// ```
    /// use locus_base::{Locus, LocusStore};
    ///
    /// let mut store = LocusStore::in_memory().unwrap();
    /// let exon = Locus::new("1", 100, 150).unwrap().with_feature_type("exon");
    /// store.add_locus(&Locus::new("1", 100, 200).unwrap().with_sublocus(exon)).unwrap();
    /// {
    ///     let scope = store.scoped_primary_feature_type("exon", true).unwrap();
    ///     assert_eq!(scope.len().unwrap(), 1);
    ///     assert_eq!(scope.iter().unwrap().next().unwrap().unwrap().feature_type(), "exon");
    /// }
    /// assert_eq!(store.primary_lids().unwrap(), vec![1]);
    /// ```
    pub fn scoped_primary_feature_type(&mut self, feature_type: &str, clear_previous: bool) -> Result<PrimaryScope<'_>> {
        let selection = self.extended_selection(feature_type, clear_previous)?;
        let previous = std::mem::replace(&mut self.primary, selection);
        self.primary_cache.take();
        debug!("Temporary primary loci: {:?}", self.primary);
        Ok(PrimaryScope { store: self, previous: Some(previous) })
    }

    /// Runs the closure with loci of the given feature type as the only primary loci.
    ///
    /// The previous selection is restored afterwards, whether the closure succeeds, fails, or panics.
    pub fn with_primary_feature_type<T, F>(&mut self, feature_type: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut LocusStore) -> Result<T>,
    {
        let mut scope = self.scoped_primary_feature_type(feature_type, true)?;
        f(&mut *scope)
    }
}

/// A guard for a temporary primary selection.
///
/// Created with [`LocusStore::scoped_primary_feature_type`].
/// The guard dereferences to the store, and dropping it restores the previous selection.
#[derive(Debug)]
pub struct PrimaryScope<'a> {
    store: &'a mut LocusStore,
    previous: Option<PrimarySelection>,
}

impl<'a> Deref for PrimaryScope<'a> {
    type Target = LocusStore;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl<'a> DerefMut for PrimaryScope<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.store
    }
}

impl<'a> Drop for PrimaryScope<'a> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if let Err(err) = self.store.restore_primary_tag(&previous) {
                warn!("Failed to restore the stored primary selection: {}", err);
            }
            self.store.primary = previous;
            self.store.primary_cache.take();
            debug!("Restored primary loci: {:?}", self.store.primary);
        }
    }
}

//-----------------------------------------------------------------------------

/// Range queries.
impl LocusStore {
    // Returns all loci with an interval intersecting [start, end], including touching endpoints.
    fn overlapping(&self, chromosome: &str, start: i64, end: i64) -> Result<Vec<Candidate>> {
        let mut statement = self.connection.prepare_cached(
            "SELECT p.lid, p.start, p.end, l.strand FROM Positions AS p
            JOIN Loci AS l ON l.lid = p.lid
            WHERE p.chromosome = ?1 AND p.bin BETWEEN ?2 AND ?3 AND p.start <= ?5 AND p.end >= ?4"
        )?;
        let mut result = Vec::new();
        for (low, high) in bin_ranges(start, end) {
            let mut rows = statement.query((chromosome, low, high, start, end))?;
            while let Some(row) = rows.next()? {
                let strand: String = row.get(3)?;
                result.push(Candidate {
                    lid: row.get(0)?,
                    start: row.get(1)?,
                    end: row.get(2)?,
                    strand: parse_strand(&strand)?,
                });
            }
        }
        Ok(result)
    }

    fn within_candidates(&self, locus: &Locus, params: &WithinQuery) -> Result<Vec<Candidate>> {
        if params.ignore_strand && params.same_strand {
            return Err(LocusError::Configuration(String::from(
                "ignore_strand and same_strand cannot be used together"
            )));
        }
        let descending = if params.ignore_strand {
            false
        } else {
            match locus.strand() {
                Strand::Forward => false,
                Strand::Reverse => true,
                Strand::Unknown => {
                    return Err(LocusError::Strand(format!("Cannot order loci within {} without a strand", locus)));
                },
            }
        };

        let primary = self.primary_set()?;
        let (start, end) = locus.coordinates();
        let mut result: Vec<Candidate> = self.overlapping(locus.chromosome(), start, end)?
            .into_iter()
            .filter(|c| primary.members.contains(&c.lid))
            .filter(|c| {
                if params.partial { c.start < end && c.end > start } else { c.start > start && c.end < end }
            })
            .filter(|c| !params.same_strand || c.strand == locus.strand())
            .collect();
        if descending {
            result.sort_unstable_by(|a, b| b.end.cmp(&a.end).then(a.lid.cmp(&b.lid)));
        } else {
            result.sort_unstable_by(|a, b| a.start.cmp(&b.start).then(a.lid.cmp(&b.lid)));
        }
        Ok(result)
    }

    /// Returns the primary loci within the interval of the given locus.
    ///
    /// By default, a locus must be strictly inside the interval: it must start after the query starts and end before the query ends.
    /// With `partial`, a locus must overlap the interior of the interval: it must start before the query ends and end after the query starts.
    ///
    /// The loci are reported in the 5' to 3' order of the query: by ascending start on the `+` strand and by descending end on the `-` strand.
    /// With `ignore_strand`, the loci are always reported by ascending start.
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Configuration`] if both `ignore_strand` and `same_strand` are set.
    /// Returns [`LocusError::Strand`] if the strand of the query is unknown and `ignore_strand` is not set.
    pub fn within(&self, locus: &Locus, params: &WithinQuery) -> Result<LocusIter<'_>> {
        let lids = self.within_candidates(locus, params)?.into_iter().map(|c| c.lid).collect();
        Ok(LocusIter::new(self, lids))
    }

    /// Returns the primary loci upstream of the given locus, nearest first.
    ///
    /// The search window extends from the stranded start of the locus `max_distance` bp upstream.
    /// Loci touching the stranded start are not reported, so the query locus is never in its own results.
    /// With `partial`, loci extending beyond the window are also reported.
    ///
    /// Returns [`LocusError::Strand`] if the strand of the query is unknown.
    pub fn upstream_loci(&self, locus: &Locus, params: &NeighborQuery) -> Result<LocusIter<'_>> {
        let boundary = locus.stranded_start()?;
        let limit = locus.upstream(params.max_distance)?;
        let window = Locus::new(locus.chromosome(), boundary.min(limit), boundary.max(limit))?
            .with_strand(locus.strand().flip());
        let lids = self.neighbors(locus, &window, params)?;
        Ok(LocusIter::new(self, lids))
    }

    /// Returns the primary loci downstream of the given locus, nearest first.
    ///
    /// The search window extends from the stranded end of the locus `max_distance` bp downstream.
    /// See [`Self::upstream_loci`] for the other parameters.
    pub fn downstream_loci(&self, locus: &Locus, params: &NeighborQuery) -> Result<LocusIter<'_>> {
        let boundary = locus.stranded_end()?;
        let limit = locus.downstream(params.max_distance)?;
        let window = Locus::new(locus.chromosome(), boundary.min(limit), boundary.max(limit))?
            .with_strand(locus.strand());
        let lids = self.neighbors(locus, &window, params)?;
        Ok(LocusIter::new(self, lids))
    }

    /// Returns the upstream and downstream loci with the same parameters.
    pub fn flanking_loci(&self, locus: &Locus, params: &NeighborQuery) -> Result<(LocusIter<'_>, LocusIter<'_>)> {
        Ok((self.upstream_loci(locus, params)?, self.downstream_loci(locus, params)?))
    }

    // Loci within the search window in the order of the window strand.
    fn neighbors(&self, locus: &Locus, window: &Locus, params: &NeighborQuery) -> Result<Vec<usize>> {
        let within = WithinQuery::default().with_partial(params.partial);
        let lids = self.within_candidates(window, &within)?
            .into_iter()
            .filter(|c| !params.same_strand || c.strand == locus.strand())
            .map(|c| c.lid)
            .take(params.n)
            .collect();
        Ok(lids)
    }

    /// Returns the primary loci that strictly contain the given locus, by ascending start.
    ///
    /// A locus must start before the query starts and end after the query ends.
    pub fn encompassing_loci(&self, locus: &Locus) -> Result<LocusIter<'_>> {
        let primary = self.primary_set()?;
        let (start, end) = locus.coordinates();
        let mut found: Vec<Candidate> = self.overlapping(locus.chromosome(), start, end)?
            .into_iter()
            .filter(|c| primary.members.contains(&c.lid) && c.start < start && c.end > end)
            .collect();
        found.sort_unstable_by(|a, b| a.start.cmp(&b.start).then(a.lid.cmp(&b.lid)));
        Ok(LocusIter::new(self, found.into_iter().map(|c| c.lid).collect()))
    }
}

//-----------------------------------------------------------------------------

/// Importing GFF files.
impl LocusStore {
    /// Imports loci from a GFF/GTF file, assembling sub-loci under their parents.
    ///
    /// The parent of a record is the first value of the parent attribute, and it must appear in the file before its children.
    /// Malformed lines and records with a missing parent are skipped with a warning.
    /// All loci are inserted in a single transaction.
    ///
    /// # Errors
    ///
    /// Passes through I/O and database errors; in that case nothing is inserted.
    pub fn import_gff<R: BufRead>(&mut self, reader: R, params: &GffParams) -> Result<ImportStats> {
        let mut stats = ImportStats::default();
        let mut nodes: Vec<ImportNode> = Vec::new();
        let mut roots: Vec<usize> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if formats::is_gff_comment_line(&line) {
                continue;
            }
            stats.total += 1;
            let record = match GffRecord::parse(&line, &params.attr_split) {
                Ok(record) => record,
                Err(message) => {
                    warn!("Skipping line {}: {}", line_num + 1, message);
                    stats.failed += 1;
                    continue;
                },
            };
            if params.skip_feature_types.iter().any(|x| *x == record.feature_type) {
                stats.skipped += 1;
                continue;
            }
            let parent = record.parent(&params.parent_attr).map(String::from);
            let locus = match record.into_locus(&params.id_attr, params.infer_types) {
                Ok(locus) => locus,
                Err(message) => {
                    warn!("Skipping line {}: {}", line_num + 1, message);
                    stats.failed += 1;
                    continue;
                },
            };

            let index = nodes.len();
            match parent {
                Some(parent) => match by_name.get(&parent) {
                    Some(&parent_index) => nodes[parent_index].children.push(index),
                    None => {
                        warn!("Skipping line {}: parent {} not found", line_num + 1, parent);
                        stats.failed += 1;
                        continue;
                    },
                },
                None => roots.push(index),
            }
            if let Some(name) = locus.name() {
                by_name.entry(String::from(name)).or_insert(index);
            }
            nodes.push(ImportNode { locus: Some(locus), children: Vec::new() });
        }

        let mut loci = Vec::with_capacity(roots.len());
        for &root in roots.iter() {
            if let Some(locus) = Self::assemble(&mut nodes, root) {
                loci.push(locus);
            }
        }
        self.mutate(|transaction| {
            for locus in loci.iter() {
                Self::insert_locus(transaction, locus)?;
            }
            Ok(())
        })?;
        stats.top_level = loci.len();
        stats.inserted = loci.iter().map(|locus| 1 + locus.descendants()).sum();

        info!(
            "Imported {} top-level loci ({} in total) from {} records; {} failed, {} skipped",
            stats.top_level, stats.inserted, stats.total, stats.failed, stats.skipped
        );
        Ok(stats)
    }

    /// Imports loci from a possibly gzip-compressed GFF/GTF file.
    ///
    /// See [`Self::import_gff`].
    pub fn import_gff_file<P: AsRef<Path>>(&mut self, filename: P, params: &GffParams) -> Result<ImportStats> {
        info!("Importing loci from {}", filename.as_ref().display());
        let reader = utils::open_file(filename)?;
        self.import_gff(reader, params)
    }

    // Moves the locus and its descendants out of the arena.
    fn assemble(nodes: &mut [ImportNode], index: usize) -> Option<Locus> {
        let children = std::mem::take(&mut nodes[index].children);
        let mut locus = nodes[index].locus.take()?;
        for child in children {
            if let Some(sublocus) = Self::assemble(nodes, child) {
                locus.add_sublocus(sublocus);
            }
        }
        Some(locus)
    }
}

//-----------------------------------------------------------------------------

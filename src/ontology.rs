//! Ontology: a collection of terms over the loci of a [`LocusStore`], with enrichment analysis.
//!
//! Terms are stored in the same database as the loci, in three tables:
//!
//! * `Terms` contains the name and the description of each term.
//! * `TermLoci` links terms to the LIDs of their loci.
//! * `TermAttributes` contains the attribute values of each term in order.

use crate::{Locus, LocusError, LocusStore, Result, Term};
use crate::formats::{self, OboTerm, TermMapParams, OBO_PARENT_ATTR};

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::io::BufRead;

use log::{info, warn};

use rand::seq::SliceRandom;

use rusqlite::{Connection, OptionalExtension};

use statrs::distribution::{DiscreteCDF, Hypergeometric};


//-----------------------------------------------------------------------------

/// Parameters for [`Ontology::enrichment`] and [`Ontology::ontology_enrichment`].
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichmentParams {
    /// Smallest term to test.
    pub min_term_size: usize,

    /// Largest term to test.
    pub max_term_size: usize,

    /// Minimum number of loci shared by the term and the target.
    pub min_overlap: usize,

    /// Report terms with a p-value at most this high.
    pub pval_cutoff: f64,

    /// Size of the universe for the hypergeometric test.
    ///
    /// Defaults to the number of distinct loci in the ontology.
    pub num_universe: Option<usize>,

    /// Report only terms that pass the Bonferroni-corrected cutoff.
    pub bonferroni: bool,
}

impl EnrichmentParams {
    /// Default smallest term size.
    pub const MIN_TERM_SIZE: usize = 2;

    /// Default largest term size.
    pub const MAX_TERM_SIZE: usize = 300;

    /// Default minimum overlap.
    pub const MIN_OVERLAP: usize = 1;

    /// Default p-value cutoff.
    pub const PVAL_CUTOFF: f64 = 0.05;
}

impl Default for EnrichmentParams {
    fn default() -> Self {
        EnrichmentParams {
            min_term_size: Self::MIN_TERM_SIZE,
            max_term_size: Self::MAX_TERM_SIZE,
            min_overlap: Self::MIN_OVERLAP,
            pval_cutoff: Self::PVAL_CUTOFF,
            num_universe: None,
            bonferroni: false,
        }
    }
}

/// A term enriched for the target loci.
#[derive(Clone, Debug, PartialEq)]
pub struct Enrichment {
    /// The enriched term.
    pub term: Term,

    /// Name of the target term in ontology-versus-ontology enrichment.
    pub target: Option<String>,

    /// Probability of at least `num_common` shared loci by chance.
    pub pval: f64,

    /// Number of loci shared by the term and the target.
    pub num_common: usize,

    /// Number of loci in the term.
    pub term_size: usize,

    /// Number of target loci present in the store.
    pub num_sampled: usize,

    /// Size of the universe.
    pub num_universe: usize,

    /// Number of terms tested.
    pub terms_tested: usize,

    /// The p-value passes the Bonferroni-corrected cutoff.
    pub bonferroni: bool,
}

//-----------------------------------------------------------------------------

/// A collection of terms over the loci of a [`LocusStore`].
///
/// The ontology owns the store and keeps its terms in the same database.
/// Loci are referenced by LID, and loci of new terms are added to the store if necessary.
///
/// # Examples
///
/// ```
/// use locus_base::{EnrichmentParams, Locus, LocusStore, Ontology, Term};
///
/// let loci: Vec<Locus> = (0..10).map(|i| Locus::new("1", i * 1000, i * 1000 + 500).unwrap()).collect();
/// let store = LocusStore::in_memory().unwrap();
/// let terms = vec![
///     Term::new("even", "even loci").with_loci(loci.iter().step_by(2).cloned()),
///     Term::new("odd", "odd loci").with_loci(loci.iter().skip(1).step_by(2).cloned()),
/// ];
/// let ontology = Ontology::from_terms(store, "parity", &terms).unwrap();
/// assert_eq!(ontology.len().unwrap(), 2);
/// assert_eq!(ontology.store().total_loci().unwrap(), 10);
///
/// // The first four even loci are enriched for the even term.
/// let target: Vec<Locus> = loci.iter().step_by(2).take(4).cloned().collect();
/// let enriched = ontology.enrichment(&target, &EnrichmentParams::default()).unwrap();
/// assert_eq!(enriched.len(), 1);
/// assert_eq!(enriched[0].term.name(), "even");
/// assert_eq!(enriched[0].num_common, 4);
/// ```
#[derive(Debug)]
pub struct Ontology {
    name: String,
    store: LocusStore,
}

/// Creating the ontology.
impl Ontology {
    // Key for the ontology name in the Tags table.
    const KEY_ONTOLOGY: &'static str = "ontology";

    const SCHEMA: [&'static str; 5] = [
        "CREATE TABLE IF NOT EXISTS Terms (
            tid INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL
        ) STRICT",
        "CREATE TABLE IF NOT EXISTS TermLoci (
            tid INTEGER NOT NULL REFERENCES Terms(tid),
            lid INTEGER NOT NULL,
            PRIMARY KEY (tid, lid)
        ) STRICT",
        "CREATE INDEX IF NOT EXISTS TermLociLid ON TermLoci(lid)",
        "CREATE TABLE IF NOT EXISTS TermAttributes (
            tid INTEGER NOT NULL REFERENCES Terms(tid),
            key TEXT NOT NULL,
            rank INTEGER NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (tid, key, rank)
        ) STRICT",
        "CREATE INDEX IF NOT EXISTS TermAttributesKey ON TermAttributes(key)",
    ];

    /// Creates an ontology with the given name in the store, or opens the existing terms.
    ///
    /// Passes through any database errors.
    pub fn new(mut store: LocusStore, name: &str) -> Result<Self> {
        store.mutate(|transaction| {
            for statement in Self::SCHEMA.iter() {
                transaction.execute(statement, ())?;
            }
            transaction.prepare_cached(
                "INSERT INTO Tags(key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value"
            )?.execute((Self::KEY_ONTOLOGY, name))?;
            Ok(())
        })?;
        Ok(Ontology { name: String::from(name), store })
    }

    /// Opens the ontology stored in the database of the store.
    ///
    /// Returns [`LocusError::InvalidData`] if the database does not contain an ontology.
    pub fn open(store: LocusStore) -> Result<Self> {
        let name: Option<String> = store.connection().prepare(
            "SELECT value FROM Tags WHERE key = ?1"
        )?.query_row((Self::KEY_ONTOLOGY,), |row| row.get(0)).optional()?;
        match name {
            Some(name) => Ok(Ontology { name, store }),
            None => Err(LocusError::InvalidData(String::from("The database does not contain an ontology"))),
        }
    }

    /// Creates an ontology from the given terms, which are inserted in a single transaction.
    ///
    /// Returns [`LocusError::AlreadyExists`] if a term with the same name already exists.
    pub fn from_terms(store: LocusStore, name: &str, terms: &[Term]) -> Result<Self> {
        let mut ontology = Self::new(store, name)?;
        ontology.store.mutate(|transaction| {
            for term in terms.iter() {
                let lids = Self::resolve_loci(transaction, term.loci())?;
                Self::insert_term(transaction, term, &lids)?;
            }
            Ok(())
        })?;
        info!("Ontology {}: inserted {} terms", ontology.name, terms.len());
        Ok(ontology)
    }

    /// Creates an ontology from an OBO file and a locus-term map.
    ///
    /// Each `[Term]` stanza becomes a term with the `id` as its name and the `name` as its description.
    /// Loci are looked up by name in the store, and each locus is also added to all `is_a` ancestors of its term.
    /// Terms missing from the OBO file and loci missing from the store are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Passes through parse, I/O, and database errors.
    pub fn from_obo<R: BufRead, S: BufRead>(
        store: LocusStore, name: &str,
        obo: R, locus_map: S, params: &TermMapParams
    ) -> Result<Self> {
        let obo_terms = formats::read_obo(obo)?;
        let locus_map = formats::read_locus_term_map(locus_map, params)?;
        let index: BTreeMap<&str, &OboTerm> = obo_terms.iter().map(|term| (term.id.as_str(), term)).collect();

        let mut term_lids: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
        let mut missing_terms = 0;
        let mut missing_loci: HashSet<&str> = HashSet::new();
        for (term_name, locus_names) in locus_map.iter() {
            let term = match index.get(term_name.as_str()) {
                Some(term) => *term,
                None => {
                    warn!("Term {} is not in the OBO file", term_name);
                    missing_terms += 1;
                    continue;
                },
            };
            let mut lids = BTreeSet::new();
            for locus_name in locus_names.iter() {
                match store.get_lid_by_name(locus_name) {
                    Ok(lid) => { lids.insert(lid); },
                    Err(LocusError::MissingLocus(_)) => { missing_loci.insert(locus_name.as_str()); },
                    Err(err) => return Err(err),
                }
            }
            for ancestor in Self::obo_ancestors(&index, term) {
                term_lids.entry(ancestor).or_default().extend(lids.iter().copied());
            }
            term_lids.entry(term.id.as_str()).or_default().extend(lids);
        }
        if missing_terms > 0 || !missing_loci.is_empty() {
            warn!("Skipped {} missing terms and {} missing loci", missing_terms, missing_loci.len());
        }

        let mut ontology = Self::new(store, name)?;
        ontology.store.mutate(|transaction| {
            for obo_term in obo_terms.iter() {
                let term = Term::new(obo_term.id.as_str(), obo_term.name.clone().unwrap_or_default())
                    .with_attrs(obo_term.attrs.clone());
                let lids: Vec<usize> = term_lids.get(obo_term.id.as_str()).map(|x| x.iter().copied().collect()).unwrap_or_default();
                Self::insert_term(transaction, &term, &lids)?;
            }
            Ok(())
        })?;
        info!("Ontology {}: inserted {} terms from OBO", ontology.name, obo_terms.len());
        Ok(ontology)
    }

    // Returns the ancestors of the term through is_a links, skipping missing terms.
    fn obo_ancestors<'a>(index: &BTreeMap<&str, &'a OboTerm>, term: &'a OboTerm) -> Vec<&'a str> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&OboTerm> = VecDeque::from([term]);
        while let Some(current) = queue.pop_front() {
            for parent in current.attrs.get(OBO_PARENT_ATTR).into_iter().flatten() {
                if let Some(&parent) = index.get(parent.as_str()) {
                    if visited.insert(parent.id.as_str()) {
                        result.push(parent.id.as_str());
                        queue.push_back(parent);
                    }
                }
            }
        }
        result
    }

    // Returns the LIDs of the loci, inserting loci missing from the store.
    fn resolve_loci(connection: &Connection, loci: &[Locus]) -> Result<Vec<usize>> {
        let mut lids = Vec::with_capacity(loci.len());
        for locus in loci.iter() {
            let lid = match LocusStore::find_lid(connection, locus)? {
                Some(lid) => lid,
                None => LocusStore::insert_locus(connection, locus)?,
            };
            lids.push(lid);
        }
        Ok(lids)
    }

    fn insert_term(connection: &Connection, term: &Term, lids: &[usize]) -> Result<usize> {
        let existing: Option<usize> = connection.prepare_cached(
            "SELECT tid FROM Terms WHERE name = ?1"
        )?.query_row((term.name(),), |row| row.get(0)).optional()?;
        if existing.is_some() {
            return Err(LocusError::AlreadyExists(format!("term {}", term.name())));
        }

        connection.prepare_cached(
            "INSERT INTO Terms(name, description) VALUES (?1, ?2)"
        )?.execute((term.name(), term.desc()))?;
        let tid = connection.last_insert_rowid() as usize;

        let mut insert_locus = connection.prepare_cached(
            "INSERT OR IGNORE INTO TermLoci(tid, lid) VALUES (?1, ?2)"
        )?;
        for lid in lids.iter() {
            insert_locus.execute((tid, lid))?;
        }
        let mut insert_attr = connection.prepare_cached(
            "INSERT INTO TermAttributes(tid, key, rank, value) VALUES (?1, ?2, ?3, ?4)"
        )?;
        for (key, values) in term.attrs().iter() {
            for (rank, value) in values.iter().enumerate() {
                insert_attr.execute((tid, key, rank, value))?;
            }
        }
        Ok(tid)
    }

    /// Adds a term to the ontology and returns its identifier.
    ///
    /// Loci of the term that are not in the store are added to it.
    /// Returns [`LocusError::AlreadyExists`] if a term with the same name already exists.
    pub fn add_term(&mut self, term: &Term) -> Result<usize> {
        self.store.mutate(|transaction| {
            let lids = Self::resolve_loci(transaction, term.loci())?;
            Self::insert_term(transaction, term, &lids)
        })
    }

    /// Deletes all terms from the ontology.
    ///
    /// The loci remain in the store.
    pub fn remove_all(&mut self) -> Result<()> {
        self.store.mutate(|transaction| {
            for table in ["TermLoci", "TermAttributes", "Terms"] {
                transaction.execute(&format!("DELETE FROM {}", table), ())?;
            }
            Ok(())
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the store containing the loci.
    pub fn store(&self) -> &LocusStore {
        &self.store
    }

    /// Returns the store, consuming the ontology.
    pub fn into_store(self) -> LocusStore {
        self.store
    }
}

//-----------------------------------------------------------------------------

// Converts a term size bound into an SQL parameter.
fn size_bound(size: usize) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

/// Reading terms.
impl Ontology {
    fn connection(&self) -> &Connection {
        self.store.connection()
    }

    fn load_term(&self, tid: usize) -> Result<Term> {
        let row: Option<(String, String)> = self.connection().prepare_cached(
            "SELECT name, description FROM Terms WHERE tid = ?1"
        )?.query_row((tid,), |row| Ok((row.get(0)?, row.get(1)?))).optional()?;
        let (name, desc) = row.ok_or_else(|| LocusError::MissingTerm(format!("TID {}", tid)))?;

        let mut attrs: BTreeMap<String, Vec<String>> = BTreeMap::new();
        {
            let mut get_attrs = self.connection().prepare_cached(
                "SELECT key, value FROM TermAttributes WHERE tid = ?1 ORDER BY key, rank"
            )?;
            let mut rows = get_attrs.query((tid,))?;
            while let Some(row) = rows.next()? {
                let key: String = row.get(0)?;
                attrs.entry(key).or_default().push(row.get(1)?);
            }
        }

        let mut loci = Vec::new();
        for lid in self.term_lids(tid)? {
            loci.push(self.store.get_locus_by_lid(lid)?);
        }
        let mut term = Term::new(name, desc).with_loci(loci).with_attrs(attrs);
        term.set_id(tid);
        Ok(term)
    }

    fn term_lids(&self, tid: usize) -> Result<Vec<usize>> {
        let mut get_lids = self.connection().prepare_cached(
            "SELECT lid FROM TermLoci WHERE tid = ?1 ORDER BY lid"
        )?;
        let lids = get_lids.query_map((tid,), |row| row.get(0))?;
        let lids = lids.collect::<rusqlite::Result<Vec<usize>>>()?;
        Ok(lids)
    }

    // Identifiers of the terms with min..=max loci in ascending order.
    fn tids_by_size(&self, min: usize, max: usize) -> Result<Vec<usize>> {
        let mut get_tids = self.connection().prepare_cached(
            "SELECT t.tid FROM Terms AS t
            LEFT JOIN TermLoci AS l ON l.tid = t.tid
            GROUP BY t.tid
            HAVING COUNT(l.lid) BETWEEN ?1 AND ?2
            ORDER BY t.tid"
        )?;
        let tids = get_tids.query_map((size_bound(min), size_bound(max)), |row| row.get(0))?;
        let tids = tids.collect::<rusqlite::Result<Vec<usize>>>()?;
        Ok(tids)
    }

    /// Returns the number of terms with `min..=max` loci.
    pub fn num_terms(&self, min: usize, max: usize) -> Result<usize> {
        Ok(self.tids_by_size(min, max)?.len())
    }

    /// Returns the number of terms with at least one locus.
    pub fn len(&self) -> Result<usize> {
        self.num_terms(1, usize::MAX)
    }

    /// Returns `true` if no term has loci.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns the number of distinct loci in the terms.
    pub fn num_distinct_loci(&self) -> Result<usize> {
        let count = self.connection().prepare_cached(
            "SELECT COUNT(DISTINCT lid) FROM TermLoci"
        )?.query_row((), |row| row.get(0))?;
        Ok(count)
    }

    /// Returns the term with the given name.
    ///
    /// Returns [`LocusError::MissingTerm`] if there is no such term.
    pub fn term_by_name(&self, name: &str) -> Result<Term> {
        let tid: Option<usize> = self.connection().prepare_cached(
            "SELECT tid FROM Terms WHERE name = ?1"
        )?.query_row((name,), |row| row.get(0)).optional()?;
        match tid {
            Some(tid) => self.load_term(tid),
            None => Err(LocusError::MissingTerm(String::from(name))),
        }
    }

    /// Returns the term with the given identifier.
    ///
    /// Returns [`LocusError::MissingTerm`] if there is no such term.
    pub fn term_by_id(&self, tid: usize) -> Result<Term> {
        self.load_term(tid)
    }

    /// Returns the terms with `min..=max` loci in insertion order.
    pub fn terms(&self, min: usize, max: usize) -> Result<Vec<Term>> {
        self.tids_by_size(min, max)?.into_iter().map(|tid| self.load_term(tid)).collect()
    }

    /// Returns the terms with `min..=max` loci that contain at least one of the given loci.
    ///
    /// Loci missing from the store are ignored.
    pub fn terms_containing(&self, loci: &[Locus], min: usize, max: usize) -> Result<Vec<Term>> {
        let tids = self.tids_containing(loci, min, max)?;
        tids.into_iter().map(|tid| self.load_term(tid)).collect()
    }

    fn tids_containing(&self, loci: &[Locus], min: usize, max: usize) -> Result<Vec<usize>> {
        let lids = self.existing_lids(loci)?;
        let mut containing: BTreeSet<usize> = BTreeSet::new();
        {
            let mut get_tids = self.connection().prepare_cached(
                "SELECT tid FROM TermLoci WHERE lid = ?1"
            )?;
            for lid in lids.iter() {
                let tids = get_tids.query_map((lid,), |row| row.get(0))?;
                for tid in tids {
                    containing.insert(tid?);
                }
            }
        }
        let sized = self.tids_by_size(min, max)?;
        Ok(sized.into_iter().filter(|tid| containing.contains(tid)).collect())
    }

    // Distinct LIDs of the loci present in the store.
    fn existing_lids(&self, loci: &[Locus]) -> Result<BTreeSet<usize>> {
        let mut lids = BTreeSet::new();
        for locus in loci.iter() {
            if let Some(lid) = LocusStore::find_lid(self.connection(), locus)? {
                lids.insert(lid);
            }
        }
        Ok(lids)
    }

    /// Returns `n` distinct random terms with `min..=max` loci.
    ///
    /// Returns [`LocusError::Capacity`] if there are not enough such terms.
    pub fn rand(&self, n: usize, min: usize, max: usize) -> Result<Vec<Term>> {
        let tids = self.tids_by_size(min, max)?;
        if n > tids.len() {
            return Err(LocusError::Capacity { requested: n, available: tids.len() });
        }
        let mut rng = rand::thread_rng();
        tids.choose_multiple(&mut rng, n).map(|&tid| self.load_term(tid)).collect()
    }

    /// Returns the ancestors of the term through the values of attribute `parent_attr`.
    ///
    /// The ancestors are listed in breadth-first order without duplicates.
    /// Parents missing from the ontology are skipped.
    pub fn parents(&self, term: &Term, parent_attr: &str) -> Result<Vec<Term>> {
        let mut result = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(String::from(term.name()));
        let mut queue: VecDeque<Vec<String>> = VecDeque::new();
        queue.push_back(term.attr(parent_attr).map(|x| x.to_vec()).unwrap_or_default());
        while let Some(names) = queue.pop_front() {
            for name in names {
                if !visited.insert(name.clone()) {
                    continue;
                }
                match self.term_by_name(&name) {
                    Ok(parent) => {
                        queue.push_back(parent.attr(parent_attr).map(|x| x.to_vec()).unwrap_or_default());
                        result.push(parent);
                    },
                    Err(LocusError::MissingTerm(_)) => {},
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(result)
    }

    /// Returns a one-line summary of the ontology.
    pub fn summary(&self) -> Result<String> {
        Ok(format!(
            "Ontology: {} - contains {} terms containing {} distinct loci",
            self.name, self.len()?, self.num_distinct_loci()?
        ))
    }
}

//-----------------------------------------------------------------------------

/// Enrichment analysis.
impl Ontology {
    /// Tests the terms containing the target loci for enrichment.
    ///
    /// Only terms with `min_term_size..=max_term_size` loci that contain at least one target locus are tested.
    /// The p-value is the probability of drawing at least the observed number of term loci in a hypergeometric sample of the target size.
    /// Terms with a p-value at most `pval_cutoff` and at least `min_overlap` shared loci are reported by ascending p-value.
    ///
    /// # Errors
    ///
    /// Returns [`LocusError::Configuration`] if the universe is smaller than a term or the target.
    pub fn enrichment(&self, loci: &[Locus], params: &EnrichmentParams) -> Result<Vec<Enrichment>> {
        let tids = self.tids_containing(loci, params.min_term_size, params.max_term_size)?;
        self.enrichment_impl(loci, &tids, params, tids.len(), None)
    }

    /// Tests each term of the other ontology as a target against this ontology.
    ///
    /// Target terms are selected with the same size limits as the tested terms.
    /// The Bonferroni correction accounts for the number of tested terms multiplied by the number of targets.
    pub fn ontology_enrichment(&self, other: &Ontology, params: &EnrichmentParams) -> Result<Vec<Enrichment>> {
        let targets = other.terms(params.min_term_size, params.max_term_size)?;
        info!("Calculating enrichment for {} terms of ontology {}", targets.len(), other.name());
        let mut result = Vec::new();
        for target in targets.iter() {
            let tids = self.tids_containing(target.loci(), params.min_term_size, params.max_term_size)?;
            let corrections = tids.len() * targets.len();
            result.extend(self.enrichment_impl(target.loci(), &tids, params, corrections, Some(target.name()))?);
        }
        result.sort_by(|a, b| a.pval.total_cmp(&b.pval));
        Ok(result)
    }

    fn enrichment_impl(
        &self, loci: &[Locus], tids: &[usize], params: &EnrichmentParams,
        corrections: usize, target: Option<&str>
    ) -> Result<Vec<Enrichment>> {
        let target_lids = self.existing_lids(loci)?;
        let num_universe = match params.num_universe {
            Some(size) => size,
            None => self.num_distinct_loci()?,
        };
        let num_sampled = target_lids.len();
        let corrected_cutoff = params.pval_cutoff / corrections.max(1) as f64;

        let mut result = Vec::new();
        for &tid in tids.iter() {
            let term_lids = self.term_lids(tid)?;
            let num_common = term_lids.iter().filter(|lid| target_lids.contains(lid)).count();
            let term_size = term_lids.len();
            let distribution = Hypergeometric::new(num_universe as u64, term_size as u64, num_sampled as u64)
                .map_err(|err| LocusError::Configuration(format!("Invalid universe size {}: {}", num_universe, err)))?;
            let pval = if num_common == 0 { 1.0 } else { distribution.sf(num_common as u64 - 1) };
            if pval > params.pval_cutoff || num_common < params.min_overlap {
                continue;
            }
            let bonferroni = pval <= corrected_cutoff;
            if params.bonferroni && !bonferroni {
                continue;
            }
            result.push(Enrichment {
                term: self.load_term(tid)?,
                target: target.map(String::from),
                pval, num_common, term_size, num_sampled, num_universe,
                terms_tested: tids.len(),
                bonferroni,
            });
        }
        result.sort_by(|a, b| a.pval.total_cmp(&b.pval));
        info!(
            "{}: {} target loci occur in {} terms, {} enriched",
            target.unwrap_or(&self.name), num_sampled, tids.len(), result.len()
        );
        Ok(result)
    }
}

//-----------------------------------------------------------------------------

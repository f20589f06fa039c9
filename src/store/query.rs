//! Parameters and results for range queries.

use crate::{Locus, LocusStore, Result};

use std::vec;

//-----------------------------------------------------------------------------

/// Parameters for [`LocusStore::within`].
///
/// # Examples
///
/// ```
/// use locus_base::WithinQuery;
///
/// let query = WithinQuery::default().with_partial(true).with_same_strand(true);
/// assert!(query.partial);
/// assert!(!query.ignore_strand);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WithinQuery {
    /// Report loci overlapping the query instead of loci contained in it.
    pub partial: bool,

    /// Order the results by ascending start regardless of the strand of the query.
    pub ignore_strand: bool,

    /// Report only loci on the same strand as the query.
    pub same_strand: bool,
}

impl WithinQuery {
    /// Returns the parameters with the given overlap mode.
    pub fn with_partial(self, partial: bool) -> Self {
        WithinQuery { partial, ..self }
    }

    /// Returns the parameters with the given strand-ordering mode.
    pub fn with_ignore_strand(self, ignore_strand: bool) -> Self {
        WithinQuery { ignore_strand, ..self }
    }

    /// Returns the parameters with the given strand filter.
    pub fn with_same_strand(self, same_strand: bool) -> Self {
        WithinQuery { same_strand, ..self }
    }
}

//-----------------------------------------------------------------------------

/// Parameters for [`LocusStore::upstream_loci`], [`LocusStore::downstream_loci`], and [`LocusStore::flanking_loci`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborQuery {
    /// Maximum number of loci to report in each direction.
    pub n: usize,

    /// Maximum distance from the query in bp.
    pub max_distance: i64,

    /// Report loci partially within the search window.
    pub partial: bool,

    /// Report only loci on the same strand as the query.
    pub same_strand: bool,
}

impl NeighborQuery {
    /// Default number of loci: unlimited.
    pub const N: usize = usize::MAX;

    /// Default maximum distance: unlimited.
    pub const MAX_DISTANCE: i64 = i64::MAX;

    /// Returns the parameters with the given number of loci.
    pub fn with_n(self, n: usize) -> Self {
        NeighborQuery { n, ..self }
    }

    /// Returns the parameters with the given maximum distance.
    pub fn with_max_distance(self, max_distance: i64) -> Self {
        NeighborQuery { max_distance, ..self }
    }

    /// Returns the parameters with the given overlap mode.
    pub fn with_partial(self, partial: bool) -> Self {
        NeighborQuery { partial, ..self }
    }

    /// Returns the parameters with the given strand filter.
    pub fn with_same_strand(self, same_strand: bool) -> Self {
        NeighborQuery { same_strand, ..self }
    }
}

impl Default for NeighborQuery {
    fn default() -> Self {
        NeighborQuery {
            n: Self::N,
            max_distance: Self::MAX_DISTANCE,
            partial: false,
            same_strand: false,
        }
    }
}

//-----------------------------------------------------------------------------

/// Loci reported by a query.
///
/// The matching LIDs are determined when the query is executed.
/// Each locus is read from the store when the iterator reaches it.
/// The iterator can be consumed only once; executing the query again repeats the search.
///
/// # Examples
///
/// ```
/// use locus_base::{Locus, LocusStore, WithinQuery};
///
/// let mut store = LocusStore::in_memory().unwrap();
/// for start in [10, 20, 30] {
///     store.add_locus(&Locus::new("1", start, start + 5).unwrap()).unwrap();
/// }
/// let query = Locus::new("1", 1, 50).unwrap();
/// let found = store.within(&query, &WithinQuery::default()).unwrap();
/// assert_eq!(found.len(), 3);
/// let starts: Vec<i64> = found.map(|x| x.unwrap().start()).collect();
/// assert_eq!(starts, vec![10, 20, 30]);
/// ```
#[derive(Debug)]
pub struct LocusIter<'a> {
    store: &'a LocusStore,
    lids: vec::IntoIter<usize>,
}

impl<'a> LocusIter<'a> {
    pub(crate) fn new(store: &'a LocusStore, lids: Vec<usize>) -> Self {
        LocusIter { store, lids: lids.into_iter() }
    }

    /// Returns the LIDs of the remaining loci without reading them.
    pub fn into_lids(self) -> Vec<usize> {
        self.lids.collect()
    }
}

impl<'a> Iterator for LocusIter<'a> {
    type Item = Result<Locus>;

    fn next(&mut self) -> Option<Self::Item> {
        let lid = self.lids.next()?;
        Some(self.store.get_locus_by_lid(lid))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lids.size_hint()
    }
}

impl<'a> ExactSizeIterator for LocusIter<'a> {}

//-----------------------------------------------------------------------------

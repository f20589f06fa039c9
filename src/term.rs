//! A named set of loci with multi-valued attributes.

use crate::{Locus, Result};

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use log::debug;


//-----------------------------------------------------------------------------

/// A named set of loci related by something outside their genomic context, such as a biological function.
///
/// Each attribute maps to a list of values, which allows repeated tags such as multiple `is_a` parents.
/// Loci are stored in insertion order, and adding a locus equal to an existing one has no effect.
///
/// # Examples
///
/// ```
/// use locus_base::{Locus, Term};
///
/// let mut term = Term::new("GO:0008152", "metabolic process");
/// assert!(term.add_locus(Locus::new("1", 100, 200).unwrap()));
/// assert!(term.add_locus(Locus::new("1", 250, 300).unwrap()));
/// assert!(!term.add_locus(Locus::new("1", 100, 200).unwrap().with_name("copy")));
/// assert_eq!(term.len(), 2);
///
/// // Loci within 100 bp of each other are combined.
/// let effective = term.effective_loci(100).unwrap();
/// assert_eq!(effective.len(), 1);
/// assert_eq!(effective[0].coordinates(), (100, 300));
///
/// term.attr_append("is_a", "GO:0008150");
/// assert_eq!(term.attr_value("is_a"), Some("GO:0008150"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Term {
    id: Option<usize>,
    name: String,
    desc: String,
    loci: Vec<Locus>,
    attrs: BTreeMap<String, Vec<String>>,
}

impl Term {
    /// Creates a new term without loci or attributes.
    pub fn new<S: Into<String>, T: Into<String>>(name: S, desc: T) -> Self {
        Term {
            id: None,
            name: name.into(),
            desc: desc.into(),
            loci: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }

    /// Returns the term with the given loci added.
    pub fn with_loci<I: IntoIterator<Item = Locus>>(mut self, loci: I) -> Self {
        for locus in loci {
            self.add_locus(locus);
        }
        self
    }

    /// Returns the term with the given attributes, replacing the existing ones.
    pub fn with_attrs(self, attrs: BTreeMap<String, Vec<String>>) -> Self {
        Term { attrs, ..self }
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = Some(id);
    }

    /// Returns the ontology identifier, if the term was read from an ontology.
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// Returns the number of loci in the term.
    pub fn len(&self) -> usize {
        self.loci.len()
    }

    /// Returns `true` if the term has no loci.
    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    pub fn loci(&self) -> &[Locus] {
        &self.loci
    }

    /// Returns `true` if the term contains a locus equal to the given locus.
    pub fn contains(&self, locus: &Locus) -> bool {
        self.loci.contains(locus)
    }

    /// Adds the locus to the term and returns `true`, or returns `false` if the term already contains an equal locus.
    pub fn add_locus(&mut self, locus: Locus) -> bool {
        if self.contains(&locus) {
            return false;
        }
        self.loci.push(locus);
        true
    }
}

//-----------------------------------------------------------------------------

/// Attributes.
impl Term {
    pub fn attrs(&self) -> &BTreeMap<String, Vec<String>> {
        &self.attrs
    }

    /// Returns all values of the attribute, or [`None`] if the attribute does not exist.
    pub fn attr(&self, key: &str) -> Option<&[String]> {
        self.attrs.get(key).map(|values| values.as_slice())
    }

    /// Returns the value of a single-valued attribute.
    ///
    /// Returns [`None`] if the attribute does not exist or has multiple values.
    pub fn attr_value(&self, key: &str) -> Option<&str> {
        match self.attrs.get(key) {
            Some(values) if values.len() == 1 => Some(&values[0]),
            _ => None,
        }
    }

    /// Replaces the values of the attribute with a single value.
    pub fn set_attr<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.attrs.insert(key.into(), vec![value.into()]);
    }

    /// Appends a value to the attribute.
    pub fn attr_append<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.attrs.entry(key.into()).or_default().push(value.into());
    }
}

//-----------------------------------------------------------------------------

/// Loci in genomic context.
impl Term {
    /// Returns the loci of the term within `max_distance` bp of the given locus.
    ///
    /// See [`Locus::distance`]. Loci on other chromosomes are never nearby.
    pub fn nearby_loci(&self, locus: &Locus, max_distance: i64) -> Vec<&Locus> {
        self.loci.iter().filter(|other| {
            locus.distance(other).map_or(false, |distance| distance <= max_distance)
        }).collect()
    }

    // Groups of loci in position order where consecutive groups are more than max_distance apart.
    fn groups(&self, max_distance: i64) -> Vec<Vec<&Locus>> {
        let mut loci: Vec<&Locus> = self.loci.iter().collect();
        loci.sort_by(|a, b| a.position_cmp(b));
        let mut groups: Vec<Vec<&Locus>> = Vec::new();
        let mut tail: Option<(String, i64)> = None;
        for locus in loci {
            let joined = match &tail {
                Some((chromosome, end)) => chromosome == locus.chromosome() && locus.start() - end - 1 <= max_distance,
                None => false,
            };
            if joined {
                if let (Some(group), Some((_, end))) = (groups.last_mut(), tail.as_mut()) {
                    group.push(locus);
                    *end = (*end).max(locus.end());
                }
            } else {
                groups.push(vec![locus]);
                tail = Some((String::from(locus.chromosome()), locus.end()));
            }
        }
        groups
    }

    /// Collapses loci within `max_distance` bp of each other into effective loci.
    ///
    /// The loci are swept in position order.
    /// If the next locus is within `max_distance` of the current effective locus, the two are combined with [`Locus::combine`].
    /// Otherwise the next locus starts a new effective locus.
    ///
    /// ```text
    ///        Locus1         Locus2
    /// -------========-------=========--------------
    ///       50     100     150    200
    ///
    /// max_distance = 100
    ///
    ///        Locus3
    /// -------========================--------------
    ///     subloci:
    ///        ========       =========
    /// ```
    pub fn effective_loci(&self, max_distance: i64) -> Result<Vec<Locus>> {
        let mut result = Vec::new();
        for group in self.groups(max_distance) {
            let mut iter = group.into_iter();
            let mut current = match iter.next() {
                Some(locus) => locus.clone(),
                None => continue,
            };
            for locus in iter {
                current = current.combine(locus)?;
            }
            result.push(current);
        }
        debug!(
            "Term {}: {} loci -> {} effective loci within {} bp",
            self.name, self.len(), result.len(), max_distance
        );
        Ok(result)
    }

    /// Returns the strongest locus from each group of loci that would be collapsed into an effective locus.
    ///
    /// The strength of a locus is the numeric value of attribute `attr`.
    /// If `lowest` is true, the lowest value is the strongest (e.g. p-values).
    /// Loci without a numeric value are the weakest.
    pub fn strongest_loci(&self, attr: &str, max_distance: i64, lowest: bool) -> Vec<&Locus> {
        let key = |locus: &Locus| -> Option<f64> { locus.attr(attr).and_then(|value| value.as_float()) };
        let stronger = |a: &Locus, b: &Locus| -> Ordering {
            match (key(a), key(b)) {
                (Some(x), Some(y)) => {
                    let order = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                    if lowest { order.reverse() } else { order }
                },
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            }
        };
        self.groups(max_distance).into_iter().filter_map(|group| {
            // The first of equally strong loci wins.
            group.into_iter().rev().max_by(|a, b| stronger(*a, *b))
        }).collect()
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Term: {}, Desc: {}, {} Loci", self.name, self.desc, self.len())
    }
}

//-----------------------------------------------------------------------------
